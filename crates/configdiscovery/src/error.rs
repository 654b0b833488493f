//! # Discovery Errors
//!
//! Dial, handshake and stream failures are ordinary values. The connector
//! retries them with backoff unless a caller-supplied predicate says
//! otherwise; they never abort.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The target could not be reached.
    #[error("unable to dial {target}: {reason}")]
    Dial { target: String, reason: String },

    /// Dialing did not finish within the target's connect timeout.
    #[error("dialing {target} timed out after {timeout:?}")]
    Timeout { target: String, timeout: Duration },

    /// The remote closed the stream before sending a handshake response.
    #[error("{target} does not implement the configuration discovery protocol")]
    NotImplemented { target: String },

    /// The handshake stream failed for some other reason.
    #[error("handshake with {target} failed: {reason}")]
    Handshake { target: String, reason: String },

    /// A stream-level failure reported by a connection.
    #[error("stream error: {0}")]
    Stream(String),

    /// The remote failed a request.
    #[error("remote failure: {0}")]
    Remote(String),

    /// The remote returned configurations that could not be decoded.
    #[error(transparent)]
    Decode(#[from] configwire::Error),

    /// The governing cancellation token was cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
