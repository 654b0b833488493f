//! # Configured Entities
//!
//! Immutable configurations produced by the builders.
//!
//! - [`HandlerConfig`] is the plain form: identity, type name, handler type
//!   and a name-keyed message ledger. Configurations decoded from the wire
//!   only ever have this form.
//! - [`Rich`] (and [`RichProjection`]) add the handler value itself and the
//!   type-keyed ledger. [`RichHandler`] is the sum over the four kinds.

use std::fmt;
use std::sync::Arc;

use crate::handler::AggregateMessageHandler;
use crate::handler::DeliveryPolicy;
use crate::handler::IntegrationMessageHandler;
use crate::handler::ProcessMessageHandler;
use crate::handler::ProjectionMessageHandler;
use crate::identity::Identity;
use crate::ledger::EntityMessageNames;
use crate::ledger::EntityMessageTypes;

/// The four kinds of message handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandlerType {
    Aggregate,
    Process,
    Integration,
    Projection,
}

impl HandlerType {
    pub const ALL: [HandlerType; 4] =
        [HandlerType::Aggregate, HandlerType::Process, HandlerType::Integration, HandlerType::Projection];
}

impl fmt::Display for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aggregate => write!(f, "aggregate"),
            Self::Process => write!(f, "process"),
            Self::Integration => write!(f, "integration"),
            Self::Projection => write!(f, "projection"),
        }
    }
}

/// An application or handler configuration.
pub trait Entity {
    fn identity(&self) -> &Identity;

    /// The fully-qualified name of the configured Rust type.
    fn type_name(&self) -> &str;

    fn message_names(&self) -> &EntityMessageNames;
}

/// A handler configuration.
pub trait HandlerEntity: Entity {
    fn handler_type(&self) -> HandlerType;

    fn is_disabled(&self) -> bool;

    /// The plain form of this configuration.
    fn config(&self) -> &HandlerConfig;
}

/// Returns true if the entities have the same type name, identity and
/// messages.
pub fn is_entity_equal(a: &dyn Entity, b: &dyn Entity) -> bool {
    a.type_name() == b.type_name() && a.identity() == b.identity() && a.message_names() == b.message_names()
}

/// Like [`is_entity_equal`], additionally comparing the handler type.
pub fn is_handler_equal(a: &dyn HandlerEntity, b: &dyn HandlerEntity) -> bool {
    a.handler_type() == b.handler_type() && is_entity_equal(a.config(), b.config())
}

/// The plain configuration of a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    pub identity: Identity,
    pub type_name: String,
    pub handler_type: HandlerType,
    pub messages: EntityMessageNames,
    pub disabled: bool,
}

impl Entity for HandlerConfig {
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

impl HandlerEntity for HandlerConfig {
    fn handler_type(&self) -> HandlerType {
        self.handler_type
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn config(&self) -> &HandlerConfig {
        self
    }
}

/// A handler configuration that retains the handler value and message types.
pub struct Rich<H: ?Sized> {
    handler: Arc<H>,
    config: HandlerConfig,
    types: EntityMessageTypes,
}

pub type RichAggregate = Rich<dyn AggregateMessageHandler>;
pub type RichProcess = Rich<dyn ProcessMessageHandler>;
pub type RichIntegration = Rich<dyn IntegrationMessageHandler>;

impl<H: ?Sized> Rich<H> {
    pub(crate) fn new(handler: Arc<H>, config: HandlerConfig, types: EntityMessageTypes) -> Self {
        Self { handler, config, types }
    }

    /// The handler value that was configured.
    pub fn handler(&self) -> &Arc<H> {
        &self.handler
    }

    pub fn message_types(&self) -> &EntityMessageTypes {
        &self.types
    }
}

impl<H: ?Sized> Clone for Rich<H> {
    fn clone(&self) -> Self {
        Self { handler: Arc::clone(&self.handler), config: self.config.clone(), types: self.types.clone() }
    }
}

impl<H: ?Sized> fmt::Debug for Rich<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rich").field("config", &self.config).finish_non_exhaustive()
    }
}

impl<H: ?Sized> Entity for Rich<H> {
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

impl<H: ?Sized> HandlerEntity for Rich<H> {
    fn handler_type(&self) -> HandlerType {
        self.config.handler_type
    }

    fn is_disabled(&self) -> bool {
        self.config.disabled
    }

    fn config(&self) -> &HandlerConfig {
        &self.config
    }
}

/// A rich projection configuration, which also carries its delivery policy.
#[derive(Debug, Clone)]
pub struct RichProjection {
    rich: Rich<dyn ProjectionMessageHandler>,
    delivery_policy: DeliveryPolicy,
}

impl RichProjection {
    pub(crate) fn new(rich: Rich<dyn ProjectionMessageHandler>, delivery_policy: DeliveryPolicy) -> Self {
        Self { rich, delivery_policy }
    }

    pub fn handler(&self) -> &Arc<dyn ProjectionMessageHandler> {
        self.rich.handler()
    }

    pub fn message_types(&self) -> &EntityMessageTypes {
        self.rich.message_types()
    }

    pub fn delivery_policy(&self) -> DeliveryPolicy {
        self.delivery_policy
    }
}

impl Entity for RichProjection {
    fn identity(&self) -> &Identity {
        self.rich.identity()
    }

    fn type_name(&self) -> &str {
        self.rich.type_name()
    }

    fn message_names(&self) -> &EntityMessageNames {
        self.rich.message_names()
    }
}

impl HandlerEntity for RichProjection {
    fn handler_type(&self) -> HandlerType {
        HandlerType::Projection
    }

    fn is_disabled(&self) -> bool {
        self.rich.is_disabled()
    }

    fn config(&self) -> &HandlerConfig {
        self.rich.config()
    }
}

/// A rich handler configuration of any kind.
#[derive(Debug, Clone)]
pub enum RichHandler {
    Aggregate(RichAggregate),
    Process(RichProcess),
    Integration(RichIntegration),
    Projection(RichProjection),
}

impl RichHandler {
    fn inner(&self) -> &dyn HandlerEntity {
        match self {
            Self::Aggregate(h) => h,
            Self::Process(h) => h,
            Self::Integration(h) => h,
            Self::Projection(h) => h,
        }
    }

    pub fn message_types(&self) -> &EntityMessageTypes {
        match self {
            Self::Aggregate(h) => h.message_types(),
            Self::Process(h) => h.message_types(),
            Self::Integration(h) => h.message_types(),
            Self::Projection(h) => h.message_types(),
        }
    }
}

impl Entity for RichHandler {
    fn identity(&self) -> &Identity {
        self.inner().config().identity()
    }

    fn type_name(&self) -> &str {
        self.inner().config().type_name()
    }

    fn message_names(&self) -> &EntityMessageNames {
        self.inner().config().message_names()
    }
}

impl HandlerEntity for RichHandler {
    fn handler_type(&self) -> HandlerType {
        self.inner().handler_type()
    }

    fn is_disabled(&self) -> bool {
        self.inner().is_disabled()
    }

    fn config(&self) -> &HandlerConfig {
        self.inner().config()
    }
}

impl From<RichAggregate> for RichHandler {
    fn from(h: RichAggregate) -> Self {
        Self::Aggregate(h)
    }
}

impl From<RichProcess> for RichHandler {
    fn from(h: RichProcess) -> Self {
        Self::Process(h)
    }
}

impl From<RichIntegration> for RichHandler {
    fn from(h: RichIntegration) -> Self {
        Self::Integration(h)
    }
}

impl From<RichProjection> for RichHandler {
    fn from(h: RichProjection) -> Self {
        Self::Projection(h)
    }
}
