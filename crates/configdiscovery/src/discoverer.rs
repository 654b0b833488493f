//! A discoverer for a fixed list of targets.

use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Error;
use crate::error::Result;
use crate::target::Target;
use crate::target::TargetObserver;

pub struct StaticTargetDiscoverer {
    targets: Vec<Target>,
    observer: Arc<dyn TargetObserver>,
}

impl StaticTargetDiscoverer {
    pub fn new(targets: impl IntoIterator<Item = Target>, observer: Arc<dyn TargetObserver>) -> Self {
        Self { targets: targets.into_iter().collect(), observer }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Announces every target as available, waits for `cancel`, then
    /// announces them all as unavailable. Returns `Cancelled`.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<()> {
        debug!(count = self.targets.len(), "announcing static targets");
        join_all(self.targets.iter().map(|t| self.observer.target_available(t))).await;
        cancel.cancelled().await;
        join_all(self.targets.iter().map(|t| self.observer.target_unavailable(t))).await;
        Err(Error::Cancelled)
    }
}
