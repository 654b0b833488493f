//! Tests for assembling applications from handlers.

mod common;

use std::sync::Arc;

use common::*;
use configkit::AggregateMessageHandler;
use configkit::ApplicationConfigurer;
use configkit::ApplicationEntity;
use configkit::ApplicationSet;
use configkit::Entity;
use configkit::ErrorKind;
use configkit::HandlerType;
use configkit::Identity;
use configkit::MessageName;
use configkit::MessageRole;
use configkit::MessageType;
use configkit::RichAggregate;
use configkit::RichApplication;
use configkit::RichProcess;
use configkit::RichVisitor;
use configkit::from_application;

fn app(
    configure: impl Fn(&mut ApplicationConfigurer<'_>) -> configkit::Result<()> + Send + Sync + 'static,
) -> configkit::Result<RichApplication> {
    from_application(AppStub::new("app::App", configure))
}

// --- Happy Path Tests ---

#[test]
fn test_aggregate_and_process_application() {
    init_tracing();
    let a = app(|c| {
        c.identity("app", APP_KEY)?;
        c.register_aggregate(aggregate())?;
        c.register_process(process())
    })
    .expect("application should build");

    assert_eq!(a.identity(), &Identity::must_new("app", APP_KEY));
    assert_eq!(a.handlers().len(), 2);

    let roles: Vec<_> = a.message_names().roles().sorted().into_iter().map(|(m, r)| (m.clone(), r)).collect();
    let mut expected = vec![
        (MessageName::of::<Cmd1>(), MessageRole::Command),
        (MessageName::of::<Evt1>(), MessageRole::Event),
        (MessageName::of::<Cmd2>(), MessageRole::Command),
        (MessageName::of::<Timeout1>(), MessageRole::Timeout),
    ];
    expected.sort();
    assert_eq!(roles, expected);

    // Cmd2 is executed by the process but handled by nothing in the
    // application, so it leaves the application. Cmd1 is produced elsewhere
    // and consumed here, which is not foreign for commands.
    let foreign = a.foreign_message_names();
    assert_eq!(foreign.roles().len(), 1);
    assert!(foreign.is_produced(&MessageName::of::<Cmd2>()));
    assert!(!foreign.roles().has(&MessageName::of::<Timeout1>()));
}

#[test]
fn test_closed_application_has_no_foreign_messages() {
    let a = app(|c| {
        c.identity("app", APP_KEY)?;
        c.register_aggregate(aggregate())?;
        c.register_process(process())?;
        c.register_integration(integration())?;
        c.register_projection(projection())
    })
    .unwrap();

    assert!(a.foreign_message_names().is_empty());
    assert!(a.foreign_message_types().is_empty());
    assert_eq!(a.handlers().aggregates().count(), 1);
    assert_eq!(a.handlers().projections().count(), 1);
    assert_eq!(a.handlers().consumers_of_type(&MessageType::of::<Evt1>()).len(), 2);
    assert_eq!(a.handlers().producers_of(&MessageName::of::<Evt2>()).len(), 1);
    assert_eq!(a.handlers().by_type(HandlerType::Integration).len(), 1);
}

#[test]
fn test_to_config_strips_to_plain_form() {
    let a = app(|c| {
        c.identity("app", APP_KEY)?;
        c.register_aggregate(aggregate())
    })
    .unwrap();

    let plain = a.to_config();
    assert!(plain.is_equal(a.config()));
    assert!(plain.handlers().is_equal(a.handlers()));
    assert_eq!(plain.message_names(), a.message_names());
}

#[test]
fn test_timeouts_may_be_shared_by_processes() {
    let other = ProcessStub::new("app::Other", |c| {
        c.identity("other", INT_KEY)?;
        c.consumes_event_type::<Evt2>()?;
        c.produces_command_type::<Cmd1>()?;
        c.schedules_timeout_type::<Timeout1>()
    });

    let a = app(move |c| {
        c.identity("app", APP_KEY)?;
        c.register_process(process())?;
        c.register_process(other.clone())
    });
    assert!(a.is_ok(), "{:?}", a.err());
}

// --- Failure Tests ---

#[test]
fn test_missing_application_identity() {
    let err = app(|c| c.register_aggregate(aggregate())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Incomplete);
    assert!(err.to_string().starts_with("app::App is configured without an identity"), "{err}");
}

#[test]
fn test_handler_error_propagates_unchanged() {
    let broken = AggregateStub::new("app::Broken", |c| c.identity("broken", AGG_KEY));
    let direct = configkit::from_aggregate(broken.clone()).unwrap_err();

    let err = app(move |c| {
        c.identity("app", APP_KEY)?;
        c.register_aggregate(broken.clone())
    })
    .unwrap_err();
    assert_eq!(err, direct);
}

#[test]
fn test_key_collision_blames_later_handler() {
    let clash = ProjectionStub::new("app::Clash", |c| {
        c.identity("clash", AGG_KEY)?;
        c.consumes_event_type::<Evt1>()
    });

    let err = app(move |c| {
        c.identity("app", APP_KEY)?;
        c.register_aggregate(aggregate())?;
        c.register_projection(clash.clone())
    })
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::IdentityCollision);
    assert_eq!(
        err.to_string(),
        format!("app::Clash can not use the handler key \"{AGG_KEY}\", because it is already used by app::Agg")
    );
}

#[test]
fn test_application_name_collision() {
    let err = app(|c| {
        c.register_aggregate(aggregate())?;
        c.identity("agg", APP_KEY)
    })
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "app::App can not use the application name \"agg\", because it is already used by app::Agg"
    );
}

#[test]
fn test_role_conflict_between_handlers() {
    // Evt1 as a command here, an event in the aggregate.
    let confused = IntegrationStub::new("app::Confused", |c| {
        c.identity("confused", INT_KEY)?;
        c.consumes_command_type::<Evt1>()
    });

    let err = app(move |c| {
        c.identity("app", APP_KEY)?;
        c.register_aggregate(aggregate())?;
        c.register_integration(confused.clone())
    })
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RoleConflict);
    assert_eq!(
        err.to_string(),
        format!(
            "app::Confused (confused) configures {} as a command but app::Agg (agg) configures it as an event",
            MessageName::of::<Evt1>(),
        )
    );
}

#[test]
fn test_command_consumed_twice() {
    let second = IntegrationStub::new("app::Int", |c| {
        c.identity("int", INT_KEY)?;
        c.consumes_command_type::<Cmd1>()
    });

    let err = app(move |c| {
        c.identity("app", APP_KEY)?;
        c.register_aggregate(aggregate())?;
        c.register_integration(second.clone())
    })
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SingleOwnerViolation);
    assert_eq!(
        err.to_string(),
        format!(
            "app::Int (int) can not consume {} commands because they are already consumed by app::Agg (agg)",
            MessageName::of::<Cmd1>(),
        )
    );
}

#[test]
fn test_event_produced_twice() {
    let second = IntegrationStub::new("app::Int", |c| {
        c.identity("int", INT_KEY)?;
        c.consumes_command_type::<Cmd2>()?;
        c.produces_event_type::<Evt1>()
    });

    let err = app(move |c| {
        c.identity("app", APP_KEY)?;
        c.register_aggregate(aggregate())?;
        c.register_integration(second.clone())
    })
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SingleOwnerViolation);
    let msg = err.to_string();
    assert!(msg.contains("app::Int (int)"), "{msg}");
    assert!(msg.contains("app::Agg (agg)"), "{msg}");
}

// --- Sets and Visitors ---

#[test]
fn test_application_set_lookups() {
    let first = app(|c| {
        c.identity("app", APP_KEY)?;
        c.register_aggregate(aggregate())
    })
    .unwrap();
    let second = from_application(AppStub::new("app::Second", |c| {
        c.identity("second", "0a9b8c7d-6e5f-4a3b-9c1d-0e2f4a6b8c0d")?;
        c.register_process(process())
    }))
    .unwrap();

    let mut set = ApplicationSet::new();
    assert!(set.add(first.clone()));
    assert!(!set.add(first.clone()));
    assert!(set.add(second));

    assert_eq!(set.by_name("second").map(|a| a.type_name()), Some("app::Second"));
    assert_eq!(set.by_key(APP_KEY).map(|a| a.type_name()), Some("app::App"));
    let agg = Identity::must_new("agg", AGG_KEY);
    assert_eq!(set.by_handler_identity(&agg).map(|a| a.type_name()), Some("app::App"));

    let plain: ApplicationSet<_> = set.iter().map(|a| a.to_config()).collect();
    assert!(set.is_equal(&plain));
}

#[derive(Default)]
struct Kinds {
    aggregates: Vec<String>,
    processes: Vec<String>,
}

impl RichVisitor for Kinds {
    type Error = std::convert::Infallible;

    fn visit_rich_aggregate(&mut self, h: &RichAggregate) -> Result<(), Self::Error> {
        self.aggregates.push(h.type_name().to_string());
        Ok(())
    }

    fn visit_rich_process(&mut self, h: &RichProcess) -> Result<(), Self::Error> {
        self.processes.push(h.type_name().to_string());
        Ok(())
    }
}

#[test]
fn test_rich_visitor_dispatches_by_kind() {
    let a = app(|c| {
        c.identity("app", APP_KEY)?;
        c.register_aggregate(aggregate())?;
        c.register_process(process())
    })
    .unwrap();

    let mut kinds = Kinds::default();
    a.handlers().accept_rich_visitor(&mut kinds).unwrap();
    assert_eq!(kinds.aggregates, vec!["app::Agg"]);
    assert_eq!(kinds.processes, vec!["app::Proc"]);

    // The rich handler still holds the original value.
    let agg = a.handlers().aggregates().next().unwrap();
    assert_eq!(agg.handler().type_name(), "app::Agg");
    let _: &Arc<dyn AggregateMessageHandler> = agg.handler();
}
