//! # Connector
//!
//! Supervises the connection to a single target:
//!
//! ```text
//! Idle -> Dialing -> (handshake) Watching -> (stream ends) Idle -> ...
//! ```
//!
//! Every successful handshake produces a new [`Client`], announced to the
//! observer exactly once with `client_connected` and withdrawn exactly once
//! with `client_disconnected` when the stream ends. Failures are retried with
//! [`Backoff`] until the cancellation token fires or the `is_fatal`
//! predicate accepts an error.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::backoff::Backoff;
use crate::client::Client;
use crate::client::ClientObserver;
use crate::error::Error;
use crate::error::Result;
use crate::target::Target;
use crate::transport::Connection;
use crate::transport::Dialer;

type TargetPredicate = Arc<dyn Fn(&Target) -> bool + Send + Sync>;
type ErrorPredicate = Arc<dyn Fn(&Error) -> bool + Send + Sync>;

/// Runs `fut` unless `cancel` fires first.
pub(crate) async fn until_cancelled<T>(cancel: &CancellationToken, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        r = fut => r,
    }
}

pub struct Connector {
    dialer: Arc<dyn Dialer>,
    observer: Arc<dyn ClientObserver>,
    ignore: Option<TargetPredicate>,
    is_fatal: Option<ErrorPredicate>,
    backoff: Backoff,
}

impl Connector {
    pub fn new(dialer: Arc<dyn Dialer>, observer: Arc<dyn ClientObserver>) -> Self {
        Self { dialer, observer, ignore: None, is_fatal: None, backoff: Backoff::default() }
    }

    /// Targets for which `pred` returns true are never dialed.
    pub fn ignore(mut self, pred: impl Fn(&Target) -> bool + Send + Sync + 'static) -> Self {
        self.ignore = Some(Arc::new(pred));
        self
    }

    /// Errors for which `pred` returns true end [`Connector::watch`] instead
    /// of being retried.
    pub fn is_fatal(mut self, pred: impl Fn(&Error) -> bool + Send + Sync + 'static) -> Self {
        self.is_fatal = Some(Arc::new(pred));
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Connects to `target` and keeps reconnecting until `cancel` fires.
    ///
    /// Returns `Ok(())` immediately for an ignored target, `Err(Cancelled)`
    /// once cancelled, or the first fatal error.
    pub async fn watch(&self, cancel: &CancellationToken, target: &Target) -> Result<()> {
        if self.ignore.as_ref().is_some_and(|ignore| ignore(target)) {
            debug!(name = %target, "target ignored");
            return Ok(());
        }

        let mut attempt = 0u32;
        loop {
            match self.connect_once(cancel, target).await {
                // Handshook and later severed, so the failure was transient.
                Ok(()) => attempt = 0,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    if self.is_fatal.as_ref().is_some_and(|fatal| fatal(&e)) {
                        warn!(name = %target, error = %e, "giving up on target");
                        return Err(e);
                    }
                    warn!(name = %target, error = %e, attempt, "unable to connect");
                }
            }

            let delay = self.backoff.delay(attempt);
            attempt = attempt.saturating_add(1);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Dials and handshakes once, then watches the stream until it ends.
    ///
    /// `Ok(())` means a client was connected and has since disconnected.
    async fn connect_once(&self, cancel: &CancellationToken, target: &Target) -> Result<()> {
        let conn = until_cancelled(cancel, self.dial(target)).await?;
        let mut stream = until_cancelled(cancel, conn.watch()).await.map_err(|e| handshake_error(target, e))?;

        match until_cancelled(cancel, stream.recv()).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(Error::NotImplemented { target: target.name.clone() }),
            Err(e) => return Err(handshake_error(target, e)),
        }

        let client = Client::new(target.clone(), conn);
        info!(name = %target, client = %client.id(), "client connected");
        self.observer.client_connected(&client).await;

        // The remote sends nothing more, so any outcome here means severance.
        let severed = until_cancelled(cancel, stream.recv()).await;

        info!(name = %target, client = %client.id(), "client disconnected");
        self.observer.client_disconnected(&client).await;

        match severed {
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                debug!(name = %target, error = %e, "watch stream failed");
                Ok(())
            }
            Ok(_) => Ok(()),
        }
    }

    async fn dial(&self, target: &Target) -> Result<Arc<dyn Connection>> {
        match target.options.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.dialer.dial(target))
                .await
                .unwrap_or_else(|_| Err(Error::Timeout { target: target.name.clone(), timeout })),
            None => self.dialer.dial(target).await,
        }
    }
}

fn handshake_error(target: &Target, e: Error) -> Error {
    match e {
        Error::Cancelled | Error::NotImplemented { .. } | Error::Handshake { .. } => e,
        other => Error::Handshake { target: target.name.clone(), reason: other.to_string() },
    }
}
