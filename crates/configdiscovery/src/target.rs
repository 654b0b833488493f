//! # Targets
//!
//! A [`Target`] is a dialable address for a remote configuration source.
//! Targets are announced to a [`TargetObserver`] as they become available or
//! unavailable.

use std::fmt;
use std::time::Duration;

/// How a target is dialed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DialOptions {
    /// Maximum time a single dial may take. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Connect without transport security.
    pub plaintext: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub name: String,
    pub options: DialOptions,
}

impl Target {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), options: DialOptions::default() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn plaintext(mut self) -> Self {
        self.options.plaintext = true;
        self
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Receives notifications about the availability of targets.
///
/// Implementations are shared between tasks, so they must be `Send + Sync`.
#[async_trait::async_trait]
pub trait TargetObserver: Send + Sync + 'static {
    async fn target_available(&self, target: &Target);

    async fn target_unavailable(&self, target: &Target);
}
