//! # Application and Handler Definitions
//!
//! The traits implemented by application authors. Each exposes a single
//! `configure()` method that the builders call exactly once with the
//! configurer for its kind.

use crate::Result;
use crate::configurer::AggregateConfigurer;
use crate::configurer::IntegrationConfigurer;
use crate::configurer::ProcessConfigurer;
use crate::configurer::ProjectionConfigurer;
use crate::application::ApplicationConfigurer;

/// An application: a named collection of handlers.
pub trait Application: Send + Sync + 'static {
    fn configure(&self, c: &mut ApplicationConfigurer<'_>) -> Result<()>;

    /// The fully-qualified name of the implementing type.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Handles commands by recording events against an aggregate root.
pub trait AggregateMessageHandler: Send + Sync + 'static {
    fn configure(&self, c: &mut AggregateConfigurer<'_>) -> Result<()>;

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Coordinates a long-running business process: handles events, executes
/// commands and schedules timeouts.
pub trait ProcessMessageHandler: Send + Sync + 'static {
    fn configure(&self, c: &mut ProcessConfigurer<'_>) -> Result<()>;

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Handles commands by interacting with external systems, optionally
/// recording events.
pub trait IntegrationMessageHandler: Send + Sync + 'static {
    fn configure(&self, c: &mut IntegrationConfigurer<'_>) -> Result<()>;

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Builds a read-model from events.
pub trait ProjectionMessageHandler: Send + Sync + 'static {
    fn configure(&self, c: &mut ProjectionConfigurer<'_>) -> Result<()>;

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// How events are delivered to a projection when the application runs on
/// more than one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeliveryPolicy {
    /// Each event is delivered to a single instance.
    #[default]
    Unicast,
    /// Each event is delivered to every instance.
    Broadcast {
        /// Deliver to the primary instance before the others.
        primary_first: bool,
    },
}
