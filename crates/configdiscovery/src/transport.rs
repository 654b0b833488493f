//! # Transport Abstraction
//!
//! The discovery layer talks to remote processes through two calls:
//!
//! - **List**: request/response, returns every application configuration the
//!   remote hosts, encoded with `configwire`.
//! - **Watch**: a long-lived stream used only for liveness. The remote sends
//!   exactly one handshake message, then nothing until the connection ends.
//!
//! The traits are object-safe (`Arc<dyn Dialer>`, `Arc<dyn Connection>`) so
//! that tests can substitute in-memory transports.

use std::sync::Arc;

use crate::error::Result;
use crate::target::Target;

/// Opens connections to targets.
#[async_trait::async_trait]
pub trait Dialer: Send + Sync + 'static {
    async fn dial(&self, target: &Target) -> Result<Arc<dyn Connection>>;
}

/// An open connection to a remote configuration source.
#[async_trait::async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Returns the encoded list of applications hosted by the remote.
    async fn list_applications(&self) -> Result<Vec<u8>>;

    /// Opens the liveness stream.
    async fn watch(&self) -> Result<Box<dyn WatchStream>>;
}

/// The receiving half of a liveness stream.
#[async_trait::async_trait]
pub trait WatchStream: Send {
    /// Waits for the next message.
    ///
    /// # invariants
    /// - Returns `Ok(None)` once the remote has closed the stream.
    /// - Returns `Err` if the stream failed.
    async fn recv(&mut self) -> Result<Option<Vec<u8>>>;
}
