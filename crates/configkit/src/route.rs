//! # Message Routes
//!
//! Routes are the declarative way of telling a handler configurer which
//! messages it uses. Each constructor returns a small typed route that
//! converts into the route enum of every handler kind it is valid for, so a
//! route that makes no sense for a handler (a projection executing commands)
//! does not compile.

use std::any::Any;
use std::fmt;

use crate::message::MessageRole;
use crate::message::MessageType;

macro_rules! route {
    ($(#[$doc:meta])* $ty:ident, $ctor:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $ty(pub MessageType);

        $(#[$doc])*
        pub fn $ctor<T: Any>() -> $ty {
            $ty(MessageType::of::<T>())
        }
    };
}

route!(
    /// The handler consumes commands of type `T`.
    HandlesCommand, handles_command
);
route!(
    /// The handler produces events of type `T`.
    RecordsEvent, records_event
);
route!(
    /// The handler consumes events of type `T`.
    HandlesEvent, handles_event
);
route!(
    /// The handler produces commands of type `T`.
    ExecutesCommand, executes_command
);
route!(
    /// The handler produces and consumes timeouts of type `T`.
    SchedulesTimeout, schedules_timeout
);

/// A route's effect on the handler's message ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RouteSpec {
    pub message: MessageType,
    pub role: MessageRole,
    pub produced: bool,
    pub consumed: bool,
    pub call: &'static str,
}

impl RouteSpec {
    pub(crate) fn consumes(message: MessageType, role: MessageRole, call: &'static str) -> Self {
        Self { message, role, produced: false, consumed: true, call }
    }

    pub(crate) fn produces(message: MessageType, role: MessageRole, call: &'static str) -> Self {
        Self { message, role, produced: true, consumed: false, call }
    }
}

/// Routes accepted by aggregate configurers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateRoute {
    HandlesCommand(MessageType),
    RecordsEvent(MessageType),
}

/// Routes accepted by process configurers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessRoute {
    HandlesEvent(MessageType),
    ExecutesCommand(MessageType),
    SchedulesTimeout(MessageType),
}

/// Routes accepted by integration configurers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrationRoute {
    HandlesCommand(MessageType),
    RecordsEvent(MessageType),
}

/// Routes accepted by projection configurers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionRoute {
    HandlesEvent(MessageType),
}

impl From<HandlesCommand> for AggregateRoute {
    fn from(r: HandlesCommand) -> Self { Self::HandlesCommand(r.0) }
}
impl From<RecordsEvent> for AggregateRoute {
    fn from(r: RecordsEvent) -> Self { Self::RecordsEvent(r.0) }
}
impl From<HandlesEvent> for ProcessRoute {
    fn from(r: HandlesEvent) -> Self { Self::HandlesEvent(r.0) }
}
impl From<ExecutesCommand> for ProcessRoute {
    fn from(r: ExecutesCommand) -> Self { Self::ExecutesCommand(r.0) }
}
impl From<SchedulesTimeout> for ProcessRoute {
    fn from(r: SchedulesTimeout) -> Self { Self::SchedulesTimeout(r.0) }
}
impl From<HandlesCommand> for IntegrationRoute {
    fn from(r: HandlesCommand) -> Self { Self::HandlesCommand(r.0) }
}
impl From<RecordsEvent> for IntegrationRoute {
    fn from(r: RecordsEvent) -> Self { Self::RecordsEvent(r.0) }
}
impl From<HandlesEvent> for ProjectionRoute {
    fn from(r: HandlesEvent) -> Self { Self::HandlesEvent(r.0) }
}

impl AggregateRoute {
    pub(crate) fn spec(self) -> RouteSpec {
        match self {
            Self::HandlesCommand(m) => RouteSpec::consumes(m, MessageRole::Command, "handles_command"),
            Self::RecordsEvent(m) => RouteSpec::produces(m, MessageRole::Event, "records_event"),
        }
    }
}

impl ProcessRoute {
    pub(crate) fn spec(self) -> RouteSpec {
        match self {
            Self::HandlesEvent(m) => RouteSpec::consumes(m, MessageRole::Event, "handles_event"),
            Self::ExecutesCommand(m) => RouteSpec::produces(m, MessageRole::Command, "executes_command"),
            Self::SchedulesTimeout(m) => RouteSpec {
                message: m,
                role: MessageRole::Timeout,
                produced: true,
                consumed: true,
                call: "schedules_timeout",
            },
        }
    }
}

impl IntegrationRoute {
    pub(crate) fn spec(self) -> RouteSpec {
        match self {
            Self::HandlesCommand(m) => RouteSpec::consumes(m, MessageRole::Command, "handles_command"),
            Self::RecordsEvent(m) => RouteSpec::produces(m, MessageRole::Event, "records_event"),
        }
    }
}

impl ProjectionRoute {
    pub(crate) fn spec(self) -> RouteSpec {
        match self {
            Self::HandlesEvent(m) => RouteSpec::consumes(m, MessageRole::Event, "handles_event"),
        }
    }
}

/// Renders the call that declared the route, e.g. `handles_command::<app::Cmd>()`.
impl fmt::Display for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::<{}>()", self.call, self.message)
    }
}
