//! # Clients
//!
//! A [`Client`] is a live connection together with the target it was dialed
//! from. Each successful handshake produces a new client with a fresh
//! [`ClientId`], so a reconnect to the same target is a different client.

use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::target::Target;
use crate::transport::Connection;

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    fn next() -> Self {
        Self(NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

#[derive(Clone)]
pub struct Client {
    id: ClientId,
    target: Target,
    connection: Arc<dyn Connection>,
}

impl Client {
    pub fn new(target: Target, connection: Arc<dyn Connection>) -> Self {
        Self { id: ClientId::next(), target, connection }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").field("id", &self.id).field("target", &self.target).finish_non_exhaustive()
    }
}

impl PartialEq for Client {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Client {}

impl Hash for Client {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Receives notifications about clients connecting and disconnecting.
#[async_trait::async_trait]
pub trait ClientObserver: Send + Sync + 'static {
    async fn client_connected(&self, client: &Client);

    async fn client_disconnected(&self, client: &Client);
}
