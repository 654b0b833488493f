//! # Inspector
//!
//! Queries a connected client for the applications it hosts and announces
//! them for as long as the client stays connected.

use std::sync::Arc;

use configkit::ApplicationConfig;
use configkit::Entity;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::application::ApplicationObserver;
use crate::application::RemoteApplication;
use crate::client::Client;
use crate::connector::until_cancelled;
use crate::error::Error;
use crate::error::Result;

type ApplicationPredicate = Arc<dyn Fn(&ApplicationConfig) -> bool + Send + Sync>;

pub struct Inspector {
    observer: Arc<dyn ApplicationObserver>,
    ignore: Option<ApplicationPredicate>,
}

impl Inspector {
    pub fn new(observer: Arc<dyn ApplicationObserver>) -> Self {
        Self { observer, ignore: None }
    }

    /// Applications for which `pred` returns true are never announced.
    pub fn ignore(mut self, pred: impl Fn(&ApplicationConfig) -> bool + Send + Sync + 'static) -> Self {
        self.ignore = Some(Arc::new(pred));
        self
    }

    /// Fetches and decodes the applications hosted by `client`, without the
    /// ignored ones.
    pub async fn inspect(&self, cancel: &CancellationToken, client: &Client) -> Result<Vec<RemoteApplication>> {
        let bytes = until_cancelled(cancel, client.connection().list_applications()).await?;
        let configs = configwire::decode_applications(&bytes)?;

        let apps: Vec<RemoteApplication> = configs
            .into_iter()
            .filter(|config| !self.ignore.as_ref().is_some_and(|ignore| ignore(config)))
            .map(|config| RemoteApplication::new(config, client.clone()))
            .collect();

        debug!(client = %client.id(), count = apps.len(), "inspected client");
        Ok(apps)
    }

    /// Announces the applications hosted by `client` as available, waits for
    /// `cancel`, then announces them as unavailable.
    ///
    /// Always returns an error: `Cancelled` after a normal run, or the
    /// failure that prevented inspection.
    pub async fn run(&self, cancel: &CancellationToken, client: &Client) -> Result<()> {
        let apps = self.inspect(cancel, client).await?;
        for app in &apps {
            debug!(client = %client.id(), application = %app.identity(), type_name = app.config().type_name(), "application available");
        }

        join_all(apps.iter().map(|a| self.observer.application_available(a))).await;
        cancel.cancelled().await;
        join_all(apps.iter().map(|a| self.observer.application_unavailable(a))).await;

        Err(Error::Cancelled)
    }
}
