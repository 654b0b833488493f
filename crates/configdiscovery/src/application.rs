//! Applications discovered on connected clients.

use std::hash::Hash;
use std::hash::Hasher;

use configkit::ApplicationConfig;
use configkit::Entity;
use configkit::Identity;

use crate::client::Client;

/// An application configuration hosted by the remote end of a [`Client`].
///
/// Two values are equal when they describe the same application on the same
/// client; the same application seen through a reconnect is a new value.
#[derive(Debug, Clone)]
pub struct RemoteApplication {
    config: ApplicationConfig,
    client: Client,
}

impl RemoteApplication {
    pub fn new(config: ApplicationConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn identity(&self) -> &Identity {
        self.config.identity()
    }
}

impl PartialEq for RemoteApplication {
    fn eq(&self, other: &Self) -> bool {
        self.client == other.client && self.identity() == other.identity()
    }
}

impl Eq for RemoteApplication {}

impl Hash for RemoteApplication {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.client.id().hash(state);
        self.identity().hash(state);
    }
}

/// Receives notifications about applications becoming available or
/// unavailable.
#[async_trait::async_trait]
pub trait ApplicationObserver: Send + Sync + 'static {
    async fn application_available(&self, app: &RemoteApplication);

    async fn application_unavailable(&self, app: &RemoteApplication);
}
