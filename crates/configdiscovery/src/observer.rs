//! # Observer Sets
//!
//! Fan-out observers. Each set tracks the items that are currently
//! available and forwards every change to all registered observers in
//! parallel, returning once they have all returned.
//!
//! - Registering an observer replays `available` for every current item.
//! - Unregistering an observer sends it `unavailable` for every current
//!   item; it receives nothing after that.
//!
//! The set's lock is held while observers run, so replays and live
//! notifications never interleave. Observers must not call back into the
//! set that is notifying them.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;

use crate::application::ApplicationObserver;
use crate::application::RemoteApplication;
use crate::client::Client;
use crate::client::ClientObserver;
use crate::target::Target;
use crate::target::TargetObserver;

struct Members<T, O: ?Sized> {
    items: HashSet<T>,
    observers: Vec<Arc<O>>,
}

impl<T: Eq + Hash, O: ?Sized> Members<T, O> {
    fn new() -> Self {
        Self { items: HashSet::new(), observers: Vec::new() }
    }

    fn add_observer(&mut self, o: &Arc<O>) -> bool {
        if self.observers.iter().any(|x| same(x, o)) {
            return false;
        }
        self.observers.push(o.clone());
        true
    }

    fn remove_observer(&mut self, o: &Arc<O>) -> bool {
        let before = self.observers.len();
        self.observers.retain(|x| !same(x, o));
        self.observers.len() != before
    }
}

fn same<O: ?Sized>(a: &Arc<O>, b: &Arc<O>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

// ============================================================================
//  TARGETS
// ============================================================================

pub struct TargetObserverSet {
    members: Mutex<Members<Target, dyn TargetObserver>>,
}

impl Default for TargetObserverSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetObserverSet {
    pub fn new() -> Self {
        Self { members: Mutex::new(Members::new()) }
    }

    pub async fn register_observer(&self, o: Arc<dyn TargetObserver>) {
        let mut m = self.members.lock().await;
        if m.add_observer(&o) {
            join_all(m.items.iter().map(|t| o.target_available(t))).await;
        }
    }

    pub async fn unregister_observer(&self, o: &Arc<dyn TargetObserver>) {
        let mut m = self.members.lock().await;
        if m.remove_observer(o) {
            join_all(m.items.iter().map(|t| o.target_unavailable(t))).await;
        }
    }

    /// The targets that are currently available.
    pub async fn targets(&self) -> Vec<Target> {
        self.members.lock().await.items.iter().cloned().collect()
    }
}

#[async_trait::async_trait]
impl TargetObserver for TargetObserverSet {
    async fn target_available(&self, target: &Target) {
        let mut m = self.members.lock().await;
        if m.items.insert(target.clone()) {
            join_all(m.observers.iter().map(|o| o.target_available(target))).await;
        }
    }

    async fn target_unavailable(&self, target: &Target) {
        let mut m = self.members.lock().await;
        if m.items.remove(target) {
            join_all(m.observers.iter().map(|o| o.target_unavailable(target))).await;
        }
    }
}

// ============================================================================
//  CLIENTS
// ============================================================================

pub struct ClientObserverSet {
    members: Mutex<Members<Client, dyn ClientObserver>>,
}

impl Default for ClientObserverSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientObserverSet {
    pub fn new() -> Self {
        Self { members: Mutex::new(Members::new()) }
    }

    pub async fn register_observer(&self, o: Arc<dyn ClientObserver>) {
        let mut m = self.members.lock().await;
        if m.add_observer(&o) {
            join_all(m.items.iter().map(|c| o.client_connected(c))).await;
        }
    }

    pub async fn unregister_observer(&self, o: &Arc<dyn ClientObserver>) {
        let mut m = self.members.lock().await;
        if m.remove_observer(o) {
            join_all(m.items.iter().map(|c| o.client_disconnected(c))).await;
        }
    }

    /// The clients that are currently connected.
    pub async fn clients(&self) -> Vec<Client> {
        self.members.lock().await.items.iter().cloned().collect()
    }
}

#[async_trait::async_trait]
impl ClientObserver for ClientObserverSet {
    async fn client_connected(&self, client: &Client) {
        let mut m = self.members.lock().await;
        if m.items.insert(client.clone()) {
            join_all(m.observers.iter().map(|o| o.client_connected(client))).await;
        }
    }

    async fn client_disconnected(&self, client: &Client) {
        let mut m = self.members.lock().await;
        if m.items.remove(client) {
            join_all(m.observers.iter().map(|o| o.client_disconnected(client))).await;
        }
    }
}

// ============================================================================
//  APPLICATIONS
// ============================================================================

pub struct ApplicationObserverSet {
    members: Mutex<Members<RemoteApplication, dyn ApplicationObserver>>,
}

impl Default for ApplicationObserverSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationObserverSet {
    pub fn new() -> Self {
        Self { members: Mutex::new(Members::new()) }
    }

    pub async fn register_observer(&self, o: Arc<dyn ApplicationObserver>) {
        let mut m = self.members.lock().await;
        if m.add_observer(&o) {
            join_all(m.items.iter().map(|a| o.application_available(a))).await;
        }
    }

    pub async fn unregister_observer(&self, o: &Arc<dyn ApplicationObserver>) {
        let mut m = self.members.lock().await;
        if m.remove_observer(o) {
            join_all(m.items.iter().map(|a| o.application_unavailable(a))).await;
        }
    }

    /// The applications that are currently available.
    pub async fn applications(&self) -> Vec<RemoteApplication> {
        self.members.lock().await.items.iter().cloned().collect()
    }
}

#[async_trait::async_trait]
impl ApplicationObserver for ApplicationObserverSet {
    async fn application_available(&self, app: &RemoteApplication) {
        let mut m = self.members.lock().await;
        if m.items.insert(app.clone()) {
            join_all(m.observers.iter().map(|o| o.application_available(app))).await;
        }
    }

    async fn application_unavailable(&self, app: &RemoteApplication) {
        let mut m = self.members.lock().await;
        if m.items.remove(app) {
            join_all(m.observers.iter().map(|o| o.application_unavailable(app))).await;
        }
    }
}
