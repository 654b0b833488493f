//! Shared fixtures: an observer that records every notification, and
//! encoded application lists for mock servers to serve.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use configdiscovery::ApplicationObserver;
use configdiscovery::Backoff;
use configdiscovery::Client;
use configdiscovery::ClientObserver;
use configdiscovery::RemoteApplication;
use configdiscovery::Target;
use configdiscovery::TargetObserver;
use configkit::ApplicationConfig;
use configkit::EntityMessageNames;
use configkit::HandlerConfig;
use configkit::HandlerType;
use configkit::Identity;
use configkit::MessageName;
use configkit::MessageRole;
use configwire::Version;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

pub const ORDERS_KEY: &str = "5b1c7e2a-9d34-4f0e-8a61-3c2d9e7f1b40";
pub const BILLING_KEY: &str = "6c2d8f3b-ae45-4a1f-9b72-4d3eaf802c51";
pub const PROJECTION_KEY: &str = "7d3e9a4c-bf56-4b2a-8c83-5e4fb0913d62";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_test_writer().try_init();
}

/// Retries quickly so tests do not wait on the default backoff.
pub fn fast() -> Backoff {
    Backoff::default().with_initial(Duration::from_millis(10)).with_max(Duration::from_millis(50))
}

/// An application with a single projection.
pub fn application(name: &str, key: &str) -> ApplicationConfig {
    let mut messages = EntityMessageNames::new();
    messages.consume(MessageName::from(format!("{name}.Changed")), MessageRole::Event).unwrap();
    let projection = HandlerConfig {
        identity: Identity::must_new(format!("{name}-projection"), PROJECTION_KEY),
        type_name: format!("{name}::Projection"),
        handler_type: HandlerType::Projection,
        messages,
        disabled: false,
    };
    ApplicationConfig::new(Identity::must_new(name, key), format!("{name}::App"), [projection]).unwrap()
}

pub fn encoded(apps: &[ApplicationConfig]) -> Vec<u8> {
    configwire::encode_applications(apps, Version::V2).unwrap()
}

/// Waits until `cond` holds, polling every few milliseconds.
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition was not met in time");
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Event {
    TargetAvailable(String),
    TargetUnavailable(String),
    Connected(String),
    Disconnected(String),
    ApplicationAvailable(String),
    ApplicationUnavailable(String),
}

pub struct Recorder {
    tx: mpsc::UnboundedSender<Event>,
}

impl Recorder {
    fn record(&self, e: Event) {
        let _ = self.tx.send(e);
    }
}

pub struct Events {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl Events {
    /// Waits for the next notification.
    pub async fn next(&mut self) -> Event {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("no notification in time")
            .expect("recorder dropped")
    }

    /// Returns a notification that has already been delivered, if any.
    pub fn try_next(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Drains every delivered notification, sorted.
    pub fn drain(&mut self) -> Vec<Event> {
        let mut out = Vec::new();
        while let Some(e) = self.try_next() {
            out.push(e);
        }
        out.sort();
        out
    }
}

pub fn recorder() -> (Arc<Recorder>, Events) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(Recorder { tx }), Events { rx })
}

#[async_trait::async_trait]
impl TargetObserver for Recorder {
    async fn target_available(&self, target: &Target) {
        self.record(Event::TargetAvailable(target.name.clone()));
    }

    async fn target_unavailable(&self, target: &Target) {
        self.record(Event::TargetUnavailable(target.name.clone()));
    }
}

#[async_trait::async_trait]
impl ClientObserver for Recorder {
    async fn client_connected(&self, client: &Client) {
        self.record(Event::Connected(client.target().name.clone()));
    }

    async fn client_disconnected(&self, client: &Client) {
        self.record(Event::Disconnected(client.target().name.clone()));
    }
}

#[async_trait::async_trait]
impl ApplicationObserver for Recorder {
    async fn application_available(&self, app: &RemoteApplication) {
        self.record(Event::ApplicationAvailable(app.identity().name().to_string()));
    }

    async fn application_unavailable(&self, app: &RemoteApplication) {
        self.record(Event::ApplicationUnavailable(app.identity().name().to_string()));
    }
}
