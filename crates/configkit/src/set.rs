//! # Handler and Application Sets
//!
//! Identity-keyed collections of configurations. A set never holds two
//! members whose names or keys coincide: [`HandlerSet::add`] refuses such a
//! member, while [`HandlerSet::try_from_handlers`] reports it as an error.

use std::collections::HashMap;
use std::collections::hash_map;

use crate::Error;
use crate::Result;
use crate::application::ApplicationEntity;
use crate::application::RichApplication;
use crate::entity::HandlerConfig;
use crate::entity::HandlerEntity;
use crate::entity::HandlerType;
use crate::entity::RichAggregate;
use crate::entity::RichHandler;
use crate::entity::RichIntegration;
use crate::entity::RichProcess;
use crate::entity::RichProjection;
use crate::entity::is_entity_equal;
use crate::error::abort;
use crate::identity::Identity;
use crate::ledger::EntityMessageNames;
use crate::ledger::EntityMessageTypes;
use crate::message::MessageName;
use crate::message::MessageType;
use crate::visitor::AcceptRichVisitor;
use crate::visitor::AcceptVisitor;
use crate::visitor::RichVisitor;
use crate::visitor::Visitor;

/// A set of handler configurations.
#[derive(Debug, Clone)]
pub struct HandlerSet<H> {
    members: HashMap<Identity, H>,
}

pub type RichHandlerSet = HandlerSet<RichHandler>;

impl<H> Default for HandlerSet<H> {
    fn default() -> Self {
        Self { members: HashMap::new() }
    }
}

impl<H: HandlerEntity> HandlerSet<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set, failing on the first member that conflicts with an
    /// earlier one.
    pub fn try_from_handlers(handlers: impl IntoIterator<Item = H>) -> Result<Self> {
        let mut set = Self::new();
        for h in handlers {
            if let Some(existing) = set.conflicting(h.identity()) {
                return Err(set_collision(h.type_name(), h.identity(), existing.type_name(), existing.identity()));
            }
            set.insert(h);
        }
        Ok(set)
    }

    /// Adds `h`, returning false without modification if its name or key is
    /// already used by a member.
    pub fn add(&mut self, h: H) -> bool {
        if self.conflicting(h.identity()).is_some() {
            return false;
        }
        self.insert(h);
        true
    }

    fn insert(&mut self, h: H) {
        if let hash_map::Entry::Vacant(entry) = self.members.entry(h.identity().clone()) {
            entry.insert(h);
        }
    }

    fn conflicting(&self, identity: &Identity) -> Option<&H> {
        self.members.values().find(|m| m.identity().conflicts_with(identity))
    }

    pub fn has(&self, identity: &Identity) -> bool {
        self.members.contains_key(identity)
    }

    pub fn by_identity(&self, identity: &Identity) -> Option<&H> {
        self.members.get(identity)
    }

    pub fn by_name(&self, name: &str) -> Option<&H> {
        self.members.values().find(|m| m.identity().name() == name)
    }

    pub fn by_key(&self, key: &str) -> Option<&H> {
        self.members.values().find(|m| m.identity().key() == key)
    }

    /// Iterates in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &H> {
        self.members.values()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the members for which `pred` returns true.
    pub fn filter(&self, pred: impl Fn(&H) -> bool) -> Self
    where
        H: Clone,
    {
        let members = self.members.iter().filter(|(_, h)| pred(h)).map(|(id, h)| (id.clone(), h.clone())).collect();
        Self { members }
    }

    /// Returns the members of the given kind.
    pub fn by_type(&self, t: HandlerType) -> Self
    where
        H: Clone,
    {
        self.filter(|h| h.handler_type() == t)
    }

    /// Returns the members that consume the named message.
    pub fn consumers_of(&self, m: &MessageName) -> Self
    where
        H: Clone,
    {
        self.filter(|h| h.message_names().is_consumed(m))
    }

    /// Returns the members that produce the named message.
    pub fn producers_of(&self, m: &MessageName) -> Self
    where
        H: Clone,
    {
        self.filter(|h| h.message_names().is_produced(m))
    }

    /// Returns the union of every member's messages.
    pub fn message_names(&self) -> EntityMessageNames {
        let mut all = EntityMessageNames::new();
        for h in self.members.values() {
            all.union(h.message_names());
        }
        all
    }

    /// Returns true if both sets hold entity-equal members under the same
    /// identities.
    pub fn is_equal<G: HandlerEntity>(&self, other: &HandlerSet<G>) -> bool {
        self.len() == other.len()
            && self.members.iter().all(|(id, h)| {
                other.by_identity(id).is_some_and(|o| h.handler_type() == o.handler_type() && is_entity_equal(h, o))
            })
    }

    /// Returns the plain forms of every member.
    pub fn to_config(&self) -> HandlerSet<HandlerConfig> {
        let members = self.members.iter().map(|(id, h)| (id.clone(), h.config().clone())).collect();
        HandlerSet { members }
    }
}

impl<H: AcceptVisitor> HandlerSet<H> {
    /// Visits every member, stopping at the first error.
    pub fn accept_visitor<V: Visitor + ?Sized>(&self, v: &mut V) -> std::result::Result<(), V::Error> {
        self.members.values().try_for_each(|h| h.accept_visitor(v))
    }
}

impl<H: AcceptRichVisitor> HandlerSet<H> {
    /// Visits every member, stopping at the first error.
    pub fn accept_rich_visitor<V: RichVisitor + ?Sized>(&self, v: &mut V) -> std::result::Result<(), V::Error> {
        self.members.values().try_for_each(|h| h.accept_rich_visitor(v))
    }
}

impl<H: HandlerEntity + PartialEq> PartialEq for HandlerSet<H> {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl<H: HandlerEntity + Eq> Eq for HandlerSet<H> {}

/// Collects handlers into a set, aborting if any two of them conflict.
impl<H: HandlerEntity> FromIterator<H> for HandlerSet<H> {
    fn from_iter<I: IntoIterator<Item = H>>(iter: I) -> Self {
        Self::try_from_handlers(iter).unwrap_or_else(|e| abort(e))
    }
}

impl RichHandlerSet {
    pub fn aggregates(&self) -> impl Iterator<Item = &RichAggregate> {
        self.members.values().filter_map(|h| match h {
            RichHandler::Aggregate(h) => Some(h),
            _ => None,
        })
    }

    pub fn processes(&self) -> impl Iterator<Item = &RichProcess> {
        self.members.values().filter_map(|h| match h {
            RichHandler::Process(h) => Some(h),
            _ => None,
        })
    }

    pub fn integrations(&self) -> impl Iterator<Item = &RichIntegration> {
        self.members.values().filter_map(|h| match h {
            RichHandler::Integration(h) => Some(h),
            _ => None,
        })
    }

    pub fn projections(&self) -> impl Iterator<Item = &RichProjection> {
        self.members.values().filter_map(|h| match h {
            RichHandler::Projection(h) => Some(h),
            _ => None,
        })
    }

    /// Returns the members that consume messages of type `t`.
    pub fn consumers_of_type(&self, t: &MessageType) -> Self {
        self.filter(|h| h.message_types().is_consumed(t))
    }

    /// Returns the members that produce messages of type `t`.
    pub fn producers_of_type(&self, t: &MessageType) -> Self {
        self.filter(|h| h.message_types().is_produced(t))
    }

    /// Returns the union of every member's message types.
    pub fn message_types(&self) -> EntityMessageTypes {
        let mut all = EntityMessageTypes::new();
        for h in self.members.values() {
            all.union(h.message_types());
        }
        all
    }
}

/// A set of application configurations.
#[derive(Debug, Clone)]
pub struct ApplicationSet<A> {
    members: HashMap<Identity, A>,
}

impl<A> Default for ApplicationSet<A> {
    fn default() -> Self {
        Self { members: HashMap::new() }
    }
}

impl<A: ApplicationEntity> ApplicationSet<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set, failing on the first application that conflicts with an
    /// earlier one.
    pub fn try_from_applications(apps: impl IntoIterator<Item = A>) -> Result<Self> {
        let mut set = Self::new();
        for a in apps {
            if let Some(existing) = set.conflicting(a.identity()) {
                return Err(set_collision(a.type_name(), a.identity(), existing.type_name(), existing.identity()));
            }
            set.members.insert(a.identity().clone(), a);
        }
        Ok(set)
    }

    /// Adds `a`, returning false without modification if its name or key is
    /// already used by a member.
    pub fn add(&mut self, a: A) -> bool {
        if self.conflicting(a.identity()).is_some() {
            return false;
        }
        self.members.insert(a.identity().clone(), a);
        true
    }

    fn conflicting(&self, identity: &Identity) -> Option<&A> {
        self.members.values().find(|m| m.identity().conflicts_with(identity))
    }

    /// Removes the application with this identity, returning it.
    pub fn remove(&mut self, identity: &Identity) -> Option<A> {
        self.members.remove(identity)
    }

    pub fn has(&self, identity: &Identity) -> bool {
        self.members.contains_key(identity)
    }

    pub fn by_identity(&self, identity: &Identity) -> Option<&A> {
        self.members.get(identity)
    }

    pub fn by_name(&self, name: &str) -> Option<&A> {
        self.members.values().find(|m| m.identity().name() == name)
    }

    pub fn by_key(&self, key: &str) -> Option<&A> {
        self.members.values().find(|m| m.identity().key() == key)
    }

    /// Returns the application containing a handler with this identity.
    pub fn by_handler_identity(&self, identity: &Identity) -> Option<&A> {
        self.members.values().find(|a| a.config().handlers().has(identity))
    }

    pub fn iter(&self) -> impl Iterator<Item = &A> {
        self.members.values()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns true if both sets hold equal applications under the same
    /// identities, comparing handler sets too.
    pub fn is_equal<B: ApplicationEntity>(&self, other: &ApplicationSet<B>) -> bool {
        self.len() == other.len()
            && self.members.iter().all(|(id, a)| other.by_identity(id).is_some_and(|b| a.config().is_equal(b.config())))
    }
}

impl<A: AcceptVisitor> ApplicationSet<A> {
    /// Visits every member, stopping at the first error.
    pub fn accept_visitor<V: Visitor + ?Sized>(&self, v: &mut V) -> std::result::Result<(), V::Error> {
        self.members.values().try_for_each(|a| a.accept_visitor(v))
    }
}

impl ApplicationSet<RichApplication> {
    /// Visits every member, stopping at the first error.
    pub fn accept_rich_visitor<V: RichVisitor + ?Sized>(&self, v: &mut V) -> std::result::Result<(), V::Error> {
        self.members.values().try_for_each(|a| a.accept_rich_visitor(v))
    }
}

/// Collects applications into a set, aborting if any two of them conflict.
impl<A: ApplicationEntity> FromIterator<A> for ApplicationSet<A> {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        Self::try_from_applications(iter).unwrap_or_else(|e| abort(e))
    }
}

fn set_collision(type_name: &str, identity: &Identity, existing: &str, existing_identity: &Identity) -> Error {
    Error::IdentityCollision(format!(
        "{type_name} can not use the identity {identity}, because it conflicts with {existing} ({existing_identity})",
    ))
}
