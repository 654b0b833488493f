//! Tests for building individual handler configurations.

mod common;

use common::*;
use configkit::DeliveryPolicy;
use configkit::Entity;
use configkit::ErrorKind;
use configkit::HandlerEntity;
use configkit::HandlerType;
use configkit::Identity;
use configkit::MessageName;
use configkit::MessageRole;
use configkit::MessageType;
use configkit::MessageTypeRegistry;
use configkit::executes_command;
use configkit::from_aggregate;
use configkit::from_integration;
use configkit::from_process;
use configkit::from_process_with;
use configkit::from_projection;
use configkit::handles_command;
use configkit::handles_event;
use configkit::records_event;
use configkit::route::ProcessRoute;
use configkit::schedules_timeout;

// --- Happy Path Tests ---

#[test]
fn test_aggregate_builds() {
    init_tracing();
    let cfg = from_aggregate(aggregate()).expect("aggregate should build");

    assert_eq!(cfg.identity(), &Identity::must_new("agg", AGG_KEY));
    assert_eq!(cfg.type_name(), "app::Agg");
    assert_eq!(cfg.handler_type(), HandlerType::Aggregate);
    assert!(!cfg.is_disabled());

    let names = cfg.message_names();
    assert_eq!(names.role_of(&MessageName::of::<Cmd1>()), Some(MessageRole::Command));
    assert!(names.is_consumed(&MessageName::of::<Cmd1>()));
    assert!(names.is_produced(&MessageName::of::<Evt1>()));
    assert!(cfg.message_types().is_produced(&MessageType::of::<Evt1>()));
}

#[test]
fn test_process_timeouts_are_produced_and_consumed() {
    let cfg = from_process(process()).expect("process should build");
    let t = MessageType::of::<Timeout1>();
    assert!(cfg.message_types().is_produced(&t));
    assert!(cfg.message_types().is_consumed(&t));
    assert_eq!(cfg.message_types().role_of(&t), Some(MessageRole::Timeout));
}

#[test]
fn test_routes_build_the_same_ledger_as_typed_calls() {
    let with_routes = ProcessStub::new("app::Proc", |c| {
        c.identity("proc", PROC_KEY)?;
        let routes: [ProcessRoute; 3] =
            [handles_event::<Evt1>().into(), executes_command::<Cmd2>().into(), schedules_timeout::<Timeout1>().into()];
        c.routes(routes)
    });

    let a = from_process(with_routes).unwrap();
    let b = from_process(process()).unwrap();
    assert_eq!(a.message_names(), b.message_names());
}

#[test]
fn test_integration_does_not_need_events() {
    let h = IntegrationStub::new("app::Int", |c| {
        c.identity("int", INT_KEY)?;
        c.route(handles_command::<Cmd2>())
    });
    assert!(from_integration(h).is_ok());
}

#[test]
fn test_projection_delivery_policy() {
    let default = from_projection(projection()).unwrap();
    assert_eq!(default.delivery_policy(), DeliveryPolicy::Unicast);

    let broadcast = ProjectionStub::new("app::Proj", |c| {
        c.identity("proj", PROJ_KEY)?;
        c.delivery_policy(DeliveryPolicy::Broadcast { primary_first: true });
        c.route(handles_event::<Evt1>())
    });
    let cfg = from_projection(broadcast).unwrap();
    assert_eq!(cfg.delivery_policy(), DeliveryPolicy::Broadcast { primary_first: true });
}

#[test]
fn test_disabled_handler_is_still_validated() {
    let disabled = AggregateStub::new("app::Agg", |c| {
        c.identity("agg", AGG_KEY)?;
        c.disable();
        c.consumes_command_type::<Cmd1>()?;
        c.produces_event_type::<Evt1>()
    });
    assert!(from_aggregate(disabled).unwrap().is_disabled());

    let incomplete = AggregateStub::new("app::Agg", |c| {
        c.identity("agg", AGG_KEY)?;
        c.disable();
        Ok(())
    });
    assert!(from_aggregate(incomplete).is_err());
}

#[test]
fn test_registry_shares_message_types() {
    let registry = MessageTypeRegistry::new();
    from_process_with(&registry, process()).unwrap();
    assert_eq!(registry.len(), 3);
    assert!(registry.get(std::any::TypeId::of::<Cmd2>()).is_some());
}

// --- Identity Tests ---

#[test]
fn test_identity_twice_names_both_values() {
    let h = AggregateStub::new("app::Agg", |c| {
        c.identity("first", AGG_KEY)?;
        c.identity("second", PROC_KEY)?;
        c.consumes_command_type::<Cmd1>()?;
        c.produces_event_type::<Evt1>()
    });

    let err = from_aggregate(h).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateDeclaration);
    assert_eq!(
        err.to_string(),
        format!(
            "app::Agg (first) has already called identity(\"first\", \"{AGG_KEY}\"), \
             it can not also call identity(\"second\", \"{PROC_KEY}\")"
        )
    );
}

#[test]
fn test_invalid_identity_cites_validator() {
    let h = AggregateStub::new("app::Agg", |c| {
        c.identity("has space", AGG_KEY)?;
        c.consumes_command_type::<Cmd1>()?;
        c.produces_event_type::<Evt1>()
    });

    let err = from_aggregate(h).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIdentity);
    let validator = Identity::new("has space", AGG_KEY).unwrap_err();
    assert_eq!(err.to_string(), format!("app::Agg is configured with an invalid identity, {validator}"));
}

#[test]
fn test_missing_identity() {
    let h = AggregateStub::new("app::Agg", |c| {
        c.consumes_command_type::<Cmd1>()?;
        c.produces_event_type::<Evt1>()
    });

    let err = from_aggregate(h).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Incomplete);
    assert!(err.to_string().starts_with("app::Agg is configured without an identity"), "{err}");
}

#[test]
fn test_abort_inside_configure_is_recovered() {
    let h = AggregateStub::new("app::Agg", |c| {
        // must_new aborts; nothing after it runs.
        let identity = Identity::must_new("agg", "not-a-uuid");
        c.identity(identity.name(), identity.key())
    });

    let err = from_aggregate(h).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIdentity);
}

#[test]
#[should_panic(expected = "bug in configure")]
fn test_foreign_panic_propagates() {
    let h = AggregateStub::new("app::Agg", |_| panic!("bug in configure"));
    let _ = from_aggregate(h);
}

#[test]
fn test_swallowed_error_still_fails_the_build() {
    let h = AggregateStub::new("app::Agg", |c| {
        c.identity("agg", AGG_KEY)?;
        c.consumes_command_type::<Cmd1>()?;
        let _ = c.consumes_command_type::<Cmd1>();
        c.produces_event_type::<Evt1>()
    });

    let err = from_aggregate(h).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateDeclaration);
}

// --- Role Tests ---

#[test]
fn test_duplicate_route_names_the_earlier_call() {
    let h = AggregateStub::new("app::Agg", |c| {
        c.identity("agg", AGG_KEY)?;
        c.consumes_command_type::<Cmd1>()?;
        c.route(handles_command::<Cmd1>())?;
        c.produces_event_type::<Evt1>()
    });

    let err = from_aggregate(h).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateDeclaration);
    let cmd = MessageName::of::<Cmd1>();
    assert_eq!(
        err.to_string(),
        format!(
            "app::Agg (agg) has already called consumes_command_type::<{cmd}>(), \
             it can not also call handles_command::<{cmd}>()"
        )
    );
}

#[test]
fn test_same_type_as_command_and_event_conflicts() {
    let h = AggregateStub::new("app::Agg", |c| {
        c.identity("agg", AGG_KEY)?;
        c.consumes_command_type::<Cmd1>()?;
        c.route(records_event::<Cmd1>())
    });

    let err = from_aggregate(h).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RoleConflict);
    let msg = err.to_string();
    assert!(msg.contains(&format!("{} as both a command and an event", MessageName::of::<Cmd1>())), "{msg}");
}

// --- Completeness Tests ---

#[test]
fn test_aggregate_requires_an_event_until_one_is_added() {
    let without = AggregateStub::new("app::Agg", |c| {
        c.identity("agg", AGG_KEY)?;
        c.consumes_command_type::<Cmd1>()
    });
    let err = from_aggregate(without).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Incomplete);
    assert_eq!(
        err.to_string(),
        "app::Agg (agg) is not configured to record any events, \
         at least one records_event() route must be added within configure()"
    );

    let with = AggregateStub::new("app::Agg", |c| {
        c.identity("agg", AGG_KEY)?;
        c.consumes_command_type::<Cmd1>()?;
        c.produces_event_type::<Evt2>()
    });
    assert!(from_aggregate(with).is_ok());
}

#[test]
fn test_first_unmet_requirement_is_reported() {
    let empty = ProcessStub::new("app::Proc", |c| c.identity("proc", PROC_KEY));
    let err = from_process(empty).unwrap_err();
    assert!(err.to_string().contains("is not configured to handle any events"), "{err}");

    let no_commands = ProcessStub::new("app::Proc", |c| {
        c.identity("proc", PROC_KEY)?;
        c.consumes_event_type::<Evt1>()
    });
    let err = from_process(no_commands).unwrap_err();
    assert!(err.to_string().contains("is not configured to execute any commands"), "{err}");
}

#[test]
fn test_projection_requires_an_event() {
    let h = ProjectionStub::new("app::Proj", |c| c.identity("proj", PROJ_KEY));
    let err = from_projection(h).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Incomplete);
}
