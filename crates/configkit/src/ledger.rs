//! # Message Ledger
//!
//! Records which messages an entity consumes and produces, and in which role.
//!
//! - [`RoleMap`] maps a message (name or type) to its [`MessageRole`].
//! - [`EntityMessages`] keeps the union of roles alongside the produced and
//!   consumed subsets. A message may be both produced and consumed by the same
//!   entity (a process scheduling its own timeouts), but always with one role.

use std::collections::HashMap;
use std::collections::hash_map;
use std::hash::Hash;

use crate::message::MessageName;
use crate::message::MessageRole;
use crate::message::MessageType;

/// A mapping of messages to their roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMap<K: Eq + Hash> {
    roles: HashMap<K, MessageRole>,
}

impl<K: Eq + Hash> Default for RoleMap<K> {
    fn default() -> Self {
        Self { roles: HashMap::new() }
    }
}

impl<K: Clone + Eq + Hash + Ord> RoleMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `k` with `role`, returning false without modification if `k` is
    /// already present (under any role).
    pub fn add(&mut self, k: K, role: MessageRole) -> bool {
        match self.roles.entry(k) {
            hash_map::Entry::Occupied(_) => false,
            hash_map::Entry::Vacant(entry) => {
                entry.insert(role);
                true
            }
        }
    }

    pub fn get(&self, k: &K) -> Option<MessageRole> {
        self.roles.get(k).copied()
    }

    pub fn has(&self, k: &K) -> bool {
        self.roles.contains_key(k)
    }

    /// Removes `k`, returning true if it was present.
    pub fn remove(&mut self, k: &K) -> bool {
        self.roles.remove(k).is_some()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Iterates in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, MessageRole)> {
        self.roles.iter().map(|(k, r)| (k, *r))
    }

    /// Calls `f` for each entry until it returns false. Returns true if every
    /// call returned true.
    pub fn each(&self, mut f: impl FnMut(&K, MessageRole) -> bool) -> bool {
        self.roles.iter().all(|(k, r)| f(k, *r))
    }

    /// Returns the entries sorted by key, for deterministic diagnostics.
    pub fn sorted(&self) -> Vec<(&K, MessageRole)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Returns true if any entry has `role`.
    pub fn has_role(&self, role: MessageRole) -> bool {
        self.roles.values().any(|r| *r == role)
    }

    /// Returns the keys with `role`.
    pub fn with_role(&self, role: MessageRole) -> impl Iterator<Item = &K> {
        self.roles.iter().filter(move |(_, r)| **r == role).map(|(k, _)| k)
    }

    /// Adds every entry of `other`.
    ///
    /// If any shared key has a different role, nothing is added and the first
    /// such key (in key order) is returned along with both roles.
    pub fn merge(&mut self, other: &RoleMap<K>) -> Result<(), RoleMismatch<K>> {
        if let Some((k, theirs)) = other.sorted().into_iter().find(|(k, r)| self.get(k).is_some_and(|ours| ours != *r)) {
            let ours = self.get(k).unwrap_or(theirs);
            return Err(RoleMismatch { message: k.clone(), existing: ours, incoming: theirs });
        }

        for (k, r) in other.iter() {
            self.add(k.clone(), r);
        }
        Ok(())
    }

    /// Converts the keys with `f`.
    pub fn map_keys<J: Clone + Eq + Hash + Ord>(&self, f: impl Fn(&K) -> J) -> RoleMap<J> {
        RoleMap { roles: self.roles.iter().map(|(k, r)| (f(k), *r)).collect() }
    }
}

impl<K: Clone + Eq + Hash + Ord> FromIterator<(K, MessageRole)> for RoleMap<K> {
    fn from_iter<I: IntoIterator<Item = (K, MessageRole)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, r) in iter {
            map.add(k, r);
        }
        map
    }
}

/// A key present in two role maps under different roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMismatch<K> {
    pub message: K,
    pub existing: MessageRole,
    pub incoming: MessageRole,
}

/// Why a message could not be added to an [`EntityMessages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Already recorded in the same direction with the same role.
    Duplicate,
    /// Already recorded with a different role.
    Conflict(MessageRole),
}

/// The messages used by a single entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMessages<K: Eq + Hash> {
    roles: RoleMap<K>,
    produced: RoleMap<K>,
    consumed: RoleMap<K>,
}

impl<K: Eq + Hash> Default for EntityMessages<K> {
    fn default() -> Self {
        Self { roles: RoleMap::default(), produced: RoleMap::default(), consumed: RoleMap::default() }
    }
}

/// Messages keyed by name.
pub type EntityMessageNames = EntityMessages<MessageName>;

/// Messages keyed by Rust type.
pub type EntityMessageTypes = EntityMessages<MessageType>;

impl<K: Clone + Eq + Hash + Ord> EntityMessages<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the entity produces `k` as `role`.
    pub fn produce(&mut self, k: K, role: MessageRole) -> Result<(), Rejection> {
        self.check(&k, role, &self.produced)?;
        self.roles.add(k.clone(), role);
        self.produced.add(k, role);
        Ok(())
    }

    /// Records that the entity consumes `k` as `role`.
    pub fn consume(&mut self, k: K, role: MessageRole) -> Result<(), Rejection> {
        self.check(&k, role, &self.consumed)?;
        self.roles.add(k.clone(), role);
        self.consumed.add(k, role);
        Ok(())
    }

    fn check(&self, k: &K, role: MessageRole, direction: &RoleMap<K>) -> Result<(), Rejection> {
        match self.roles.get(k) {
            Some(existing) if existing != role => Err(Rejection::Conflict(existing)),
            _ if direction.has(k) => Err(Rejection::Duplicate),
            _ => Ok(()),
        }
    }

    /// The union of produced and consumed messages.
    pub fn roles(&self) -> &RoleMap<K> {
        &self.roles
    }

    pub fn produced(&self) -> &RoleMap<K> {
        &self.produced
    }

    pub fn consumed(&self) -> &RoleMap<K> {
        &self.consumed
    }

    pub fn role_of(&self, k: &K) -> Option<MessageRole> {
        self.roles.get(k)
    }

    pub fn is_produced(&self, k: &K) -> bool {
        self.produced.has(k)
    }

    pub fn is_consumed(&self, k: &K) -> bool {
        self.consumed.has(k)
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Adds everything in `other` without role checks.
    ///
    /// Callers reconcile roles first; on a mismatch the existing role wins.
    pub fn union(&mut self, other: &EntityMessages<K>) {
        for (k, r) in other.roles.iter() {
            self.roles.add(k.clone(), r);
        }
        for (k, r) in other.produced.iter() {
            self.produced.add(k.clone(), r);
        }
        for (k, r) in other.consumed.iter() {
            self.consumed.add(k.clone(), r);
        }
    }

    /// Returns the messages for which `keep` returns true.
    pub fn filter(&self, keep: impl Fn(&K, MessageRole) -> bool) -> Self {
        let pick = |map: &RoleMap<K>| -> RoleMap<K> {
            map.iter().filter(|(k, r)| keep(k, *r)).map(|(k, r)| (k.clone(), r)).collect()
        };
        Self { roles: pick(&self.roles), produced: pick(&self.produced), consumed: pick(&self.consumed) }
    }

    /// Converts the keys with `f`.
    pub fn map_keys<J: Clone + Eq + Hash + Ord>(&self, f: impl Fn(&K) -> J) -> EntityMessages<J> {
        EntityMessages {
            roles: self.roles.map_keys(&f),
            produced: self.produced.map_keys(&f),
            consumed: self.consumed.map_keys(&f),
        }
    }
}

impl EntityMessageTypes {
    /// Returns the name-keyed equivalent of this ledger.
    pub fn names(&self) -> EntityMessageNames {
        self.map_keys(|t| t.name().clone())
    }
}
