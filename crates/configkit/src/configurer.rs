//! # Handler Configurers
//!
//! A configurer is handed to a handler's `configure()` method and accumulates
//! the facts it declares: identity, routes and flags. Every declaration is
//! checked as it is made; the first violation is returned to the caller and is
//! also remembered, so a `configure()` that discards the error still fails to
//! build.

use std::any::Any;
use std::collections::HashMap;

use crate::Error;
use crate::Result;
use crate::handler::DeliveryPolicy;
use crate::identity::Identity;
use crate::ledger::EntityMessageTypes;
use crate::ledger::Rejection;
use crate::message::MessageRole;
use crate::message::MessageType;
use crate::message::MessageTypeRegistry;
use crate::route::AggregateRoute;
use crate::route::IntegrationRoute;
use crate::route::ProcessRoute;
use crate::route::ProjectionRoute;
use crate::route::RouteSpec;

/// Renders `type_name`, followed by the configured name once there is one.
pub(crate) fn describe_entity(type_name: &str, identity: &Identity) -> String {
    if identity.is_zero() {
        type_name.to_string()
    } else {
        format!("{type_name} ({})", identity.name())
    }
}

/// Validates an `identity()` call against the identity bound so far.
pub(crate) fn bind_identity(type_name: &str, current: &Identity, name: &str, key: &str) -> Result<Identity> {
    if !current.is_zero() {
        return Err(Error::DuplicateDeclaration(format!(
            "{} has already called identity({:?}, {:?}), it can not also call identity({:?}, {:?})",
            describe_entity(type_name, current),
            current.name(),
            current.key(),
            name,
            key,
        )));
    }

    Identity::new(name, key).map_err(|source| Error::InvalidIdentity {
        entity: Some(type_name.to_string()),
        source,
    })
}

/// Everything a handler declared, once `configure()` has returned.
#[derive(Debug)]
pub(crate) struct Declared {
    pub type_name: &'static str,
    pub identity: Identity,
    pub types: EntityMessageTypes,
    pub disabled: bool,
}

impl Declared {
    pub fn describe(&self) -> String {
        describe_entity(self.type_name, &self.identity)
    }
}

/// State and behavior shared by the configurers of every handler kind.
#[derive(Debug)]
pub struct EntityConfigurer<'r> {
    type_name: &'static str,
    identity: Identity,
    types: EntityMessageTypes,
    /// The call that first declared each message, for diagnostics.
    calls: HashMap<MessageType, String>,
    disabled: bool,
    fault: Option<Error>,
    registry: &'r MessageTypeRegistry,
}

impl<'r> EntityConfigurer<'r> {
    pub(crate) fn new(type_name: &'static str, registry: &'r MessageTypeRegistry) -> Self {
        Self {
            type_name,
            identity: Identity::default(),
            types: EntityMessageTypes::new(),
            calls: HashMap::new(),
            disabled: false,
            fault: None,
            registry,
        }
    }

    /// Sets the handler's identity. Must be called exactly once.
    pub fn identity(&mut self, name: &str, key: &str) -> Result<()> {
        match bind_identity(self.type_name, &self.identity, name, key) {
            Ok(identity) => {
                self.identity = identity;
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Marks the handler as disabled. Its routes are still validated.
    pub fn disable(&mut self) {
        self.disabled = true;
    }

    pub(crate) fn route(&mut self, spec: RouteSpec) -> Result<()> {
        let message = self.registry.intern(spec.message.clone());

        let mut outcome = Ok(());
        if spec.produced {
            outcome = self.types.produce(message.clone(), spec.role);
        }
        if outcome.is_ok() && spec.consumed {
            outcome = self.types.consume(message.clone(), spec.role);
        }

        let rejection = match outcome {
            Ok(()) => {
                self.calls.entry(message).or_insert_with(|| spec.to_string());
                return Ok(());
            }
            Err(rejection) => rejection,
        };

        let entity = describe_entity(self.type_name, &self.identity);
        let previous = self.calls.get(&message).cloned().unwrap_or_default();
        let err = match rejection {
            Rejection::Duplicate => Error::DuplicateDeclaration(format!(
                "{entity} has already called {previous}, it can not also call {spec}",
            )),
            Rejection::Conflict(existing) => Error::RoleConflict(format!(
                "{entity} is configured to use {message} as both {} and {}, it has already called {previous}",
                existing.with_article(),
                spec.role.with_article(),
            )),
        };
        self.fail(err)
    }

    pub(crate) fn typed<T: Any>(&mut self, role: MessageRole, produced: bool, call: &'static str) -> Result<()> {
        let message = self.registry.of::<T>();
        let spec = if produced {
            RouteSpec::produces(message, role, call)
        } else {
            RouteSpec::consumes(message, role, call)
        };
        self.route(spec)
    }

    /// Records `err` as the configurer's fault (unless one is already
    /// recorded) and returns it.
    pub(crate) fn fail<T>(&mut self, err: Error) -> Result<T> {
        if self.fault.is_none() {
            self.fault = Some(err.clone());
        }
        Err(err)
    }

    /// Ends configuration, preferring the recorded fault over the callback's
    /// own result.
    pub(crate) fn finish(self, outcome: Result<()>) -> Result<Declared> {
        if let Some(fault) = self.fault {
            return Err(fault);
        }
        outcome?;

        Ok(Declared {
            type_name: self.type_name,
            identity: self.identity,
            types: self.types,
            disabled: self.disabled,
        })
    }
}

/// Generates the methods every handler configurer shares.
macro_rules! handler_configurer {
    ($configurer:ident, $route:ident) => {
        impl<'r> $configurer<'r> {
            /// Sets the handler's identity. Must be called exactly once.
            pub fn identity(&mut self, name: &str, key: &str) -> Result<()> {
                self.entity.identity(name, key)
            }

            /// Adds a single route.
            pub fn route(&mut self, route: impl Into<$route>) -> Result<()> {
                self.entity.route(route.into().spec())
            }

            /// Adds several routes, stopping at the first invalid one.
            pub fn routes(&mut self, routes: impl IntoIterator<Item = $route>) -> Result<()> {
                routes.into_iter().try_for_each(|r| self.entity.route(r.spec()))
            }

            /// Marks the handler as disabled. Its routes are still validated.
            pub fn disable(&mut self) {
                self.entity.disable();
            }
        }
    };
}

/// Configurer passed to [`AggregateMessageHandler::configure`](crate::AggregateMessageHandler::configure).
#[derive(Debug)]
pub struct AggregateConfigurer<'r> {
    pub(crate) entity: EntityConfigurer<'r>,
}

handler_configurer!(AggregateConfigurer, AggregateRoute);

impl<'r> AggregateConfigurer<'r> {
    pub fn consumes_command_type<T: Any>(&mut self) -> Result<()> {
        self.entity.typed::<T>(MessageRole::Command, false, "consumes_command_type")
    }

    pub fn produces_event_type<T: Any>(&mut self) -> Result<()> {
        self.entity.typed::<T>(MessageRole::Event, true, "produces_event_type")
    }
}

/// Configurer passed to [`ProcessMessageHandler::configure`](crate::ProcessMessageHandler::configure).
#[derive(Debug)]
pub struct ProcessConfigurer<'r> {
    pub(crate) entity: EntityConfigurer<'r>,
}

handler_configurer!(ProcessConfigurer, ProcessRoute);

impl<'r> ProcessConfigurer<'r> {
    pub fn consumes_event_type<T: Any>(&mut self) -> Result<()> {
        self.entity.typed::<T>(MessageRole::Event, false, "consumes_event_type")
    }

    pub fn produces_command_type<T: Any>(&mut self) -> Result<()> {
        self.entity.typed::<T>(MessageRole::Command, true, "produces_command_type")
    }

    /// Declares a timeout the process both schedules and handles.
    pub fn schedules_timeout_type<T: Any>(&mut self) -> Result<()> {
        let message = self.entity.registry.of::<T>();
        self.entity.route(RouteSpec {
            message,
            role: MessageRole::Timeout,
            produced: true,
            consumed: true,
            call: "schedules_timeout_type",
        })
    }
}

/// Configurer passed to [`IntegrationMessageHandler::configure`](crate::IntegrationMessageHandler::configure).
#[derive(Debug)]
pub struct IntegrationConfigurer<'r> {
    pub(crate) entity: EntityConfigurer<'r>,
}

handler_configurer!(IntegrationConfigurer, IntegrationRoute);

impl<'r> IntegrationConfigurer<'r> {
    pub fn consumes_command_type<T: Any>(&mut self) -> Result<()> {
        self.entity.typed::<T>(MessageRole::Command, false, "consumes_command_type")
    }

    pub fn produces_event_type<T: Any>(&mut self) -> Result<()> {
        self.entity.typed::<T>(MessageRole::Event, true, "produces_event_type")
    }
}

/// Configurer passed to [`ProjectionMessageHandler::configure`](crate::ProjectionMessageHandler::configure).
#[derive(Debug)]
pub struct ProjectionConfigurer<'r> {
    pub(crate) entity: EntityConfigurer<'r>,
    pub(crate) delivery_policy: DeliveryPolicy,
}

handler_configurer!(ProjectionConfigurer, ProjectionRoute);

impl<'r> ProjectionConfigurer<'r> {
    pub fn consumes_event_type<T: Any>(&mut self) -> Result<()> {
        self.entity.typed::<T>(MessageRole::Event, false, "consumes_event_type")
    }

    /// Sets how events are delivered when the projection runs on several nodes.
    pub fn delivery_policy(&mut self, policy: DeliveryPolicy) {
        self.delivery_policy = policy;
    }
}
