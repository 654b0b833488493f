//! In-memory transports for testing.
//!
//! These are used by the test suite and are not part of the stable API.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use tokio::sync::mpsc;

use crate::error::Error;
use crate::error::Result;
use crate::target::Target;
use crate::transport::Connection;
use crate::transport::Dialer;
use crate::transport::WatchStream;

/// A dialer that connects to [`MockServer`]s by target name.
#[derive(Default)]
pub struct MockDialer {
    servers: Mutex<HashMap<String, Arc<MockServer>>>,
}

impl MockDialer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Starts serving `applications` (an encoded list) under `name`.
    pub fn serve(&self, name: &str, applications: Vec<u8>) -> Arc<MockServer> {
        let server = Arc::new(MockServer {
            applications,
            refuse: AtomicBool::new(false),
            fail_listing: AtomicBool::new(false),
            speaks_protocol: AtomicBool::new(true),
            dials: AtomicUsize::new(0),
            streams: Mutex::new(Vec::new()),
        });
        self.servers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), server.clone());
        server
    }
}

#[async_trait::async_trait]
impl Dialer for MockDialer {
    async fn dial(&self, target: &Target) -> Result<Arc<dyn Connection>> {
        let server = self.servers.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).get(&target.name).cloned();
        let Some(server) = server else {
            return Err(Error::Dial { target: target.name.clone(), reason: "no such host".into() });
        };

        server.dials.fetch_add(1, Ordering::SeqCst);
        if server.refuse.load(Ordering::SeqCst) {
            return Err(Error::Dial { target: target.name.clone(), reason: "connection refused".into() });
        }
        Ok(Arc::new(MockConnection { server }))
    }
}

/// The remote end of a mock connection.
pub struct MockServer {
    applications: Vec<u8>,
    refuse: AtomicBool,
    fail_listing: AtomicBool,
    speaks_protocol: AtomicBool,
    dials: AtomicUsize,
    /// Senders for every open watch stream. Dropping one severs its stream.
    streams: Mutex<Vec<mpsc::UnboundedSender<Vec<u8>>>>,
}

impl MockServer {
    /// Makes later dials fail (or succeed again).
    pub fn refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Makes later application list requests fail on the remote.
    pub fn fail_listing(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }

    /// Makes later watch streams close without a handshake.
    pub fn without_protocol(&self) {
        self.speaks_protocol.store(false, Ordering::SeqCst);
    }

    /// Closes every open watch stream.
    pub fn sever(&self) {
        self.streams.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clear();
    }

    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    pub fn open_streams(&self) -> usize {
        let mut streams = self.streams.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        streams.retain(|tx| !tx.is_closed());
        streams.len()
    }
}

struct MockConnection {
    server: Arc<MockServer>,
}

#[async_trait::async_trait]
impl Connection for MockConnection {
    async fn list_applications(&self) -> Result<Vec<u8>> {
        if self.server.fail_listing.load(Ordering::SeqCst) {
            return Err(Error::Remote("application list unavailable".into()));
        }
        Ok(self.server.applications.clone())
    }

    async fn watch(&self) -> Result<Box<dyn WatchStream>> {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.server.speaks_protocol.load(Ordering::SeqCst) {
            tx.send(Vec::new()).map_err(|_| Error::Stream("channel closed".into()))?;
            self.server.streams.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(tx);
        }
        Ok(Box::new(MockStream { rx }))
    }
}

struct MockStream {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

#[async_trait::async_trait]
impl WatchStream for MockStream {
    async fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.rx.recv().await)
    }
}
