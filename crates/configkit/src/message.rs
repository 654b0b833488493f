//! # Message Names, Types and Roles
//!
//! A [`MessageType`] identifies a concrete Rust type used as a message; a
//! [`MessageName`] is its stable, serializable name. Configurations built from
//! handler values carry types, configurations decoded from the wire carry names.

use std::any::Any;
use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use dashmap::DashMap;

/// The semantic category of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageRole {
    Command,
    Event,
    Timeout,
}

impl MessageRole {
    pub const ALL: [MessageRole; 3] = [MessageRole::Command, MessageRole::Event, MessageRole::Timeout];

    /// Returns the role preceded by its indefinite article, e.g. "an event".
    pub fn with_article(self) -> &'static str {
        match self {
            Self::Command => "a command",
            Self::Event => "an event",
            Self::Timeout => "a timeout",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => write!(f, "command"),
            Self::Event => write!(f, "event"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// The stable name of a message type.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageName(Arc<str>);

impl MessageName {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Returns the name of `T`, as reported by [`std::any::type_name`].
    ///
    /// That text is not guaranteed to be stable across compiler versions.
    /// Names sent over the wire should come from processes built with the
    /// same toolchain, or be constructed explicitly with [`MessageName::new`].
    pub fn of<T: Any>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for MessageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl From<&str> for MessageName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for MessageName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A concrete message type.
///
/// Equality and hashing use the [`TypeId`]; the name is carried along for
/// display and for deriving name-keyed ledgers.
#[derive(Clone)]
pub struct MessageType {
    id: TypeId,
    name: MessageName,
}

impl MessageType {
    pub fn of<T: Any>() -> Self {
        Self { id: TypeId::of::<T>(), name: MessageName::of::<T>() }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &MessageName {
        &self.name
    }
}

impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MessageType {}

impl Hash for MessageType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for MessageType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MessageType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name).then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.name, f)
    }
}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageType({})", self.name)
    }
}

/// Interns [`MessageType`]s so that every use of a Rust type shares one
/// canonical value (and one name allocation).
///
/// Registries are owned by whoever builds configurations; a registry passed to
/// the builders of one application makes all of its handlers share tokens.
#[derive(Debug, Default)]
pub struct MessageTypeRegistry {
    types: DashMap<TypeId, MessageType>,
}

impl MessageTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical [`MessageType`] for `T`.
    pub fn of<T: Any>(&self) -> MessageType {
        self.types.entry(TypeId::of::<T>()).or_insert_with(MessageType::of::<T>).clone()
    }

    /// Returns the canonical value equal to `t`, registering `t` if it is new.
    pub fn intern(&self, t: MessageType) -> MessageType {
        self.types.entry(t.id).or_insert(t).clone()
    }

    pub fn get(&self, id: TypeId) -> Option<MessageType> {
        self.types.get(&id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
