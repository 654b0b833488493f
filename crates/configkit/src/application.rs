//! # Application Assembler
//!
//! An application registers its handlers from within its own `configure()`.
//! Each registration builds the handler immediately and checks its identity
//! against everything registered so far. Once `configure()` returns, handlers
//! are reconciled pairwise in registration order:
//!
//! - a message must have the same role in every handler that uses it;
//! - a command may be consumed by only one handler;
//! - an event may be produced by only one handler.
//!
//! Timeouts are exempt from the single-owner checks. Finally the union of all
//! handler messages is computed, along with the "foreign" subset: commands
//! produced but never consumed inside the application, and events consumed but
//! never produced inside it.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use tracing::debug;

use crate::Error;
use crate::Result;
use crate::builder::from_aggregate_with;
use crate::builder::from_integration_with;
use crate::builder::from_process_with;
use crate::builder::from_projection_with;
use crate::builder::missing_identity;
use crate::configurer::bind_identity;
use crate::configurer::describe_entity;
use crate::entity::Entity;
use crate::entity::HandlerConfig;
use crate::entity::HandlerEntity;
use crate::entity::RichHandler;
use crate::entity::is_entity_equal;
use crate::error::recover;
use crate::handler::AggregateMessageHandler;
use crate::handler::Application;
use crate::handler::IntegrationMessageHandler;
use crate::handler::ProcessMessageHandler;
use crate::handler::ProjectionMessageHandler;
use crate::identity::Identity;
use crate::ledger::EntityMessageNames;
use crate::ledger::EntityMessageTypes;
use crate::ledger::EntityMessages;
use crate::message::MessageRole;
use crate::message::MessageTypeRegistry;
use crate::set::HandlerSet;
use crate::set::RichHandlerSet;

/// An application configuration, plain or rich.
pub trait ApplicationEntity: Entity {
    /// The plain form of this configuration.
    fn config(&self) -> &ApplicationConfig;
}

/// Configurer passed to [`Application::configure`].
pub struct ApplicationConfigurer<'r> {
    type_name: &'static str,
    identity: Identity,
    /// Registered handlers, in registration order.
    handlers: Vec<RichHandler>,
    registry: &'r MessageTypeRegistry,
    fault: Option<Error>,
}

impl<'r> ApplicationConfigurer<'r> {
    fn new(type_name: &'static str, registry: &'r MessageTypeRegistry) -> Self {
        Self { type_name, identity: Identity::default(), handlers: Vec::new(), registry, fault: None }
    }

    /// Sets the application's identity. Must be called exactly once.
    pub fn identity(&mut self, name: &str, key: &str) -> Result<()> {
        let identity = match bind_identity(self.type_name, &self.identity, name, key) {
            Ok(identity) => identity,
            Err(e) => return self.fail(e),
        };

        for h in &self.handlers {
            if let Some(err) = identity_collision(self.type_name, "application", &identity, h.type_name(), h.identity())
            {
                return self.fail(err);
            }
        }

        self.identity = identity;
        Ok(())
    }

    pub fn register_aggregate(&mut self, h: Arc<dyn AggregateMessageHandler>) -> Result<()> {
        let built = from_aggregate_with(self.registry, h).map(RichHandler::from);
        self.register(built)
    }

    pub fn register_process(&mut self, h: Arc<dyn ProcessMessageHandler>) -> Result<()> {
        let built = from_process_with(self.registry, h).map(RichHandler::from);
        self.register(built)
    }

    pub fn register_integration(&mut self, h: Arc<dyn IntegrationMessageHandler>) -> Result<()> {
        let built = from_integration_with(self.registry, h).map(RichHandler::from);
        self.register(built)
    }

    pub fn register_projection(&mut self, h: Arc<dyn ProjectionMessageHandler>) -> Result<()> {
        let built = from_projection_with(self.registry, h).map(RichHandler::from);
        self.register(built)
    }

    fn register(&mut self, built: Result<RichHandler>) -> Result<()> {
        let h = match built {
            Ok(h) => h,
            Err(e) => return self.fail(e),
        };

        let registered: Vec<&dyn HandlerEntity> = self.handlers.iter().map(|h| h as &dyn HandlerEntity).collect();
        if let Some(err) = handler_collision(&h, &registered, self.type_name, &self.identity) {
            return self.fail(err);
        }

        debug!(application = self.type_name, handler = h.type_name(), identity = %h.identity(), "registered handler");
        self.handlers.push(h);
        Ok(())
    }

    fn fail<T>(&mut self, err: Error) -> Result<T> {
        if self.fault.is_none() {
            self.fault = Some(err.clone());
        }
        Err(err)
    }

    fn finish(self, outcome: Result<()>) -> Result<(Identity, Vec<RichHandler>)> {
        if let Some(fault) = self.fault {
            return Err(fault);
        }
        outcome?;
        Ok((self.identity, self.handlers))
    }
}

/// Builds the configuration of an application and all of its handlers.
pub fn from_application(app: Arc<dyn Application>) -> Result<RichApplication> {
    from_application_with(&MessageTypeRegistry::new(), app)
}

/// Builds the configuration of an application, interning message types in
/// `registry`.
pub fn from_application_with(registry: &MessageTypeRegistry, app: Arc<dyn Application>) -> Result<RichApplication> {
    let type_name = app.type_name();
    let result = recover(|| {
        let mut c = ApplicationConfigurer::new(type_name, registry);
        let outcome = app.configure(&mut c);
        let (identity, handlers) = c.finish(outcome)?;

        if identity.is_zero() {
            return Err(missing_identity(type_name));
        }

        let ordered: Vec<&dyn HandlerEntity> = handlers.iter().map(|h| h as &dyn HandlerEntity).collect();
        reconcile(&ordered)?;

        let mut types = EntityMessageTypes::new();
        for h in &handlers {
            types.union(h.message_types());
        }
        let foreign_types = foreign(&types);

        let config = ApplicationConfig {
            identity,
            type_name: type_name.to_string(),
            handlers: HandlerSet::try_from_handlers(handlers.iter().map(|h| h.config().clone()))?,
            messages: types.names(),
            foreign: foreign_types.names(),
        };

        Ok(RichApplication {
            application: Arc::clone(&app),
            config,
            handlers: RichHandlerSet::try_from_handlers(handlers)?,
            types,
            foreign_types,
        })
    });

    match &result {
        Ok(a) => debug!(application = type_name, handlers = a.handlers.len(), "built application configuration"),
        Err(e) => debug!(application = type_name, error = %e, "application configuration is invalid"),
    }
    result
}

/// Checks a handler about to be registered against the registered handlers,
/// then against the application itself.
fn handler_collision(
    h: &dyn HandlerEntity,
    registered: &[&dyn HandlerEntity],
    app_type: &str,
    app_identity: &Identity,
) -> Option<Error> {
    registered
        .iter()
        .find_map(|other| identity_collision(h.type_name(), "handler", h.identity(), other.type_name(), other.identity()))
        .or_else(|| {
            if app_identity.is_zero() {
                return None;
            }
            identity_collision(h.type_name(), "handler", h.identity(), app_type, app_identity)
        })
}

fn identity_collision(
    type_name: &str,
    kind: &str,
    identity: &Identity,
    other_type: &str,
    other: &Identity,
) -> Option<Error> {
    let (what, value) = if identity.name() == other.name() {
        ("name", identity.name())
    } else if identity.key() == other.key() {
        ("key", identity.key())
    } else {
        return None;
    };

    Some(Error::IdentityCollision(format!(
        "{type_name} can not use the {kind} {what} \"{value}\", because it is already used by {other_type}",
    )))
}

/// Checks every handler against each handler registered before it.
fn reconcile(handlers: &[&dyn HandlerEntity]) -> Result<()> {
    for (i, h) in handlers.iter().enumerate() {
        for other in &handlers[..i] {
            reconcile_pair(*h, *other)?;
        }
    }
    Ok(())
}

fn reconcile_pair(h: &dyn HandlerEntity, other: &dyn HandlerEntity) -> Result<()> {
    let ours = h.message_names();
    let theirs = other.message_names();

    for (m, role) in ours.roles().sorted() {
        let Some(their_role) = theirs.role_of(m) else {
            continue;
        };

        let describe = || (describe_entity(h.type_name(), h.identity()), describe_entity(other.type_name(), other.identity()));

        if their_role != role {
            let (h, other) = describe();
            return Err(Error::RoleConflict(format!(
                "{h} configures {m} as {} but {other} configures it as {}",
                role.with_article(),
                their_role.with_article(),
            )));
        }

        match role {
            MessageRole::Command if ours.is_consumed(m) && theirs.is_consumed(m) => {
                let (h, other) = describe();
                return Err(Error::SingleOwnerViolation(format!(
                    "{h} can not consume {m} commands because they are already consumed by {other}",
                )));
            }
            MessageRole::Event if ours.is_produced(m) && theirs.is_produced(m) => {
                let (h, other) = describe();
                return Err(Error::SingleOwnerViolation(format!(
                    "{h} can not produce {m} events because they are already produced by {other}",
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Commands produced but not consumed, and events consumed but not produced.
fn foreign<K: Clone + Eq + Hash + Ord>(all: &EntityMessages<K>) -> EntityMessages<K> {
    all.filter(|k, role| match role {
        MessageRole::Command => all.is_produced(k) && !all.is_consumed(k),
        MessageRole::Event => all.is_consumed(k) && !all.is_produced(k),
        MessageRole::Timeout => false,
    })
}

/// The plain configuration of an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationConfig {
    identity: Identity,
    type_name: String,
    handlers: HandlerSet<HandlerConfig>,
    messages: EntityMessageNames,
    foreign: EntityMessageNames,
}

impl ApplicationConfig {
    /// Assembles an application from already-built handler configurations,
    /// such as ones decoded from the wire. Handlers are checked in the order
    /// given, exactly as if the application had registered them.
    pub fn new(
        identity: Identity,
        type_name: impl Into<String>,
        handlers: impl IntoIterator<Item = HandlerConfig>,
    ) -> Result<Self> {
        let type_name = type_name.into();
        identity.validate().map_err(|source| Error::InvalidIdentity { entity: Some(type_name.clone()), source })?;

        let mut ordered: Vec<HandlerConfig> = Vec::new();
        for h in handlers {
            h.identity
                .validate()
                .map_err(|source| Error::InvalidIdentity { entity: Some(h.type_name.clone()), source })?;

            let registered: Vec<&dyn HandlerEntity> = ordered.iter().map(|h| h as &dyn HandlerEntity).collect();
            if let Some(err) = handler_collision(&h, &registered, &type_name, &identity) {
                return Err(err);
            }
            ordered.push(h);
        }

        let refs: Vec<&dyn HandlerEntity> = ordered.iter().map(|h| h as &dyn HandlerEntity).collect();
        reconcile(&refs)?;

        let mut messages = EntityMessageNames::new();
        for h in &ordered {
            messages.union(&h.messages);
        }
        let foreign = foreign(&messages);

        Ok(Self { identity, type_name, handlers: HandlerSet::try_from_handlers(ordered)?, messages, foreign })
    }

    pub fn handlers(&self) -> &HandlerSet<HandlerConfig> {
        &self.handlers
    }

    /// Messages that cross the application boundary.
    pub fn foreign_message_names(&self) -> &EntityMessageNames {
        &self.foreign
    }

    /// Returns true if the applications are entity-equal and hold equal
    /// handler sets.
    pub fn is_equal(&self, other: &ApplicationConfig) -> bool {
        is_entity_equal(self, other) && self.handlers.is_equal(&other.handlers)
    }
}

impl Entity for ApplicationConfig {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn message_names(&self) -> &EntityMessageNames {
        &self.messages
    }
}

impl ApplicationEntity for ApplicationConfig {
    fn config(&self) -> &ApplicationConfig {
        self
    }
}

/// An application configuration that retains the application value, its rich
/// handler configurations and message types.
#[derive(Clone)]
pub struct RichApplication {
    application: Arc<dyn Application>,
    config: ApplicationConfig,
    handlers: RichHandlerSet,
    types: EntityMessageTypes,
    foreign_types: EntityMessageTypes,
}

impl RichApplication {
    pub fn application(&self) -> &Arc<dyn Application> {
        &self.application
    }

    pub fn handlers(&self) -> &RichHandlerSet {
        &self.handlers
    }

    pub fn message_types(&self) -> &EntityMessageTypes {
        &self.types
    }

    pub fn foreign_message_types(&self) -> &EntityMessageTypes {
        &self.foreign_types
    }

    pub fn foreign_message_names(&self) -> &EntityMessageNames {
        self.config.foreign_message_names()
    }

    /// Strips the application down to its plain form.
    pub fn to_config(&self) -> ApplicationConfig {
        self.config.clone()
    }
}

impl fmt::Debug for RichApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RichApplication").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Entity for RichApplication {
    fn identity(&self) -> &Identity {
        &self.config.identity
    }

    fn type_name(&self) -> &str {
        &self.config.type_name
    }

    fn message_names(&self) -> &EntityMessageNames {
        &self.config.messages
    }
}

impl ApplicationEntity for RichApplication {
    fn config(&self) -> &ApplicationConfig {
        &self.config
    }
}
