//! # Configuration Builders
//!
//! Turns a handler value into its immutable configuration:
//!
//! 1. Create a configurer bound to fresh state.
//! 2. Call `configure()` once, inside [`recover`] so that aborts raised
//!    anywhere beneath it become an ordinary `Err`.
//! 3. Check that everything the handler kind requires was declared, reporting
//!    the first requirement that is not met.
//! 4. Freeze the declarations into a rich configuration.

use std::sync::Arc;

use tracing::debug;

use crate::Error;
use crate::Result;
use crate::configurer::AggregateConfigurer;
use crate::configurer::Declared;
use crate::configurer::EntityConfigurer;
use crate::configurer::IntegrationConfigurer;
use crate::configurer::ProcessConfigurer;
use crate::configurer::ProjectionConfigurer;
use crate::entity::HandlerConfig;
use crate::entity::HandlerType;
use crate::entity::Rich;
use crate::entity::RichAggregate;
use crate::entity::RichIntegration;
use crate::entity::RichProcess;
use crate::entity::RichProjection;
use crate::error::recover;
use crate::handler::AggregateMessageHandler;
use crate::handler::DeliveryPolicy;
use crate::handler::IntegrationMessageHandler;
use crate::handler::ProcessMessageHandler;
use crate::handler::ProjectionMessageHandler;
use crate::message::MessageRole;
use crate::message::MessageTypeRegistry;

/// Builds the configuration of an aggregate.
pub fn from_aggregate(h: Arc<dyn AggregateMessageHandler>) -> Result<RichAggregate> {
    from_aggregate_with(&MessageTypeRegistry::new(), h)
}

/// Builds the configuration of an aggregate, interning message types in `registry`.
pub fn from_aggregate_with(registry: &MessageTypeRegistry, h: Arc<dyn AggregateMessageHandler>) -> Result<RichAggregate> {
    let type_name = h.type_name();
    let result = recover(|| {
        let mut c = AggregateConfigurer { entity: EntityConfigurer::new(type_name, registry) };
        let outcome = h.configure(&mut c);
        let declared = c.entity.finish(outcome)?;

        require_identity(&declared)?;
        require(&declared, MessageRole::Command, false, "handle any commands", "handles_command")?;
        require(&declared, MessageRole::Event, true, "record any events", "records_event")?;

        Ok(freeze(h.clone(), HandlerType::Aggregate, declared))
    });
    log_outcome(type_name, result)
}

/// Builds the configuration of a process.
pub fn from_process(h: Arc<dyn ProcessMessageHandler>) -> Result<RichProcess> {
    from_process_with(&MessageTypeRegistry::new(), h)
}

/// Builds the configuration of a process, interning message types in `registry`.
pub fn from_process_with(registry: &MessageTypeRegistry, h: Arc<dyn ProcessMessageHandler>) -> Result<RichProcess> {
    let type_name = h.type_name();
    let result = recover(|| {
        let mut c = ProcessConfigurer { entity: EntityConfigurer::new(type_name, registry) };
        let outcome = h.configure(&mut c);
        let declared = c.entity.finish(outcome)?;

        require_identity(&declared)?;
        require(&declared, MessageRole::Event, false, "handle any events", "handles_event")?;
        require(&declared, MessageRole::Command, true, "execute any commands", "executes_command")?;

        Ok(freeze(h.clone(), HandlerType::Process, declared))
    });
    log_outcome(type_name, result)
}

/// Builds the configuration of an integration.
pub fn from_integration(h: Arc<dyn IntegrationMessageHandler>) -> Result<RichIntegration> {
    from_integration_with(&MessageTypeRegistry::new(), h)
}

/// Builds the configuration of an integration, interning message types in `registry`.
pub fn from_integration_with(
    registry: &MessageTypeRegistry,
    h: Arc<dyn IntegrationMessageHandler>,
) -> Result<RichIntegration> {
    let type_name = h.type_name();
    let result = recover(|| {
        let mut c = IntegrationConfigurer { entity: EntityConfigurer::new(type_name, registry) };
        let outcome = h.configure(&mut c);
        let declared = c.entity.finish(outcome)?;

        require_identity(&declared)?;
        require(&declared, MessageRole::Command, false, "handle any commands", "handles_command")?;

        Ok(freeze(h.clone(), HandlerType::Integration, declared))
    });
    log_outcome(type_name, result)
}

/// Builds the configuration of a projection.
pub fn from_projection(h: Arc<dyn ProjectionMessageHandler>) -> Result<RichProjection> {
    from_projection_with(&MessageTypeRegistry::new(), h)
}

/// Builds the configuration of a projection, interning message types in `registry`.
pub fn from_projection_with(
    registry: &MessageTypeRegistry,
    h: Arc<dyn ProjectionMessageHandler>,
) -> Result<RichProjection> {
    let type_name = h.type_name();
    let result = recover(|| {
        let mut c = ProjectionConfigurer {
            entity: EntityConfigurer::new(type_name, registry),
            delivery_policy: DeliveryPolicy::default(),
        };
        let outcome = h.configure(&mut c);
        let delivery_policy = c.delivery_policy;
        let declared = c.entity.finish(outcome)?;

        require_identity(&declared)?;
        require(&declared, MessageRole::Event, false, "handle any events", "handles_event")?;

        Ok(RichProjection::new(freeze(h.clone(), HandlerType::Projection, declared), delivery_policy))
    });
    log_outcome(type_name, result)
}

pub(crate) fn require_identity(declared: &Declared) -> Result<()> {
    if declared.identity.is_zero() {
        return Err(missing_identity(declared.type_name));
    }
    Ok(())
}

pub(crate) fn missing_identity(type_name: &str) -> Error {
    Error::Incomplete(format!(
        "{type_name} is configured without an identity, identity() must be called exactly once within configure()",
    ))
}

/// Requires at least one message with `role` in the given direction.
fn require(declared: &Declared, role: MessageRole, produced: bool, what: &str, route: &str) -> Result<()> {
    let map = if produced { declared.types.produced() } else { declared.types.consumed() };
    if !map.has_role(role) {
        return Err(Error::Incomplete(format!(
            "{} is not configured to {what}, at least one {route}() route must be added within configure()",
            declared.describe(),
        )));
    }
    Ok(())
}

fn freeze<H: ?Sized>(handler: Arc<H>, handler_type: HandlerType, declared: Declared) -> Rich<H> {
    let config = HandlerConfig {
        identity: declared.identity,
        type_name: declared.type_name.to_string(),
        handler_type,
        messages: declared.types.names(),
        disabled: declared.disabled,
    };
    Rich::new(handler, config, declared.types)
}

fn log_outcome<T>(type_name: &str, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => debug!(handler = type_name, "built handler configuration"),
        Err(e) => debug!(handler = type_name, error = %e, "handler configuration is invalid"),
    }
    result
}
