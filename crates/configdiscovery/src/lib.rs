//! # Configdiscovery
//!
//! Finds the application configurations hosted by remote processes.
//!
//! ## Pipeline
//!
//! ```text
//! targets ──► TargetExecutor ──► Connector ──► clients ──► ClientExecutor ──► Inspector ──► applications
//! ```
//!
//! - A discoverer (for example [`StaticTargetDiscoverer`]) announces
//!   [`Target`]s to a [`TargetObserver`].
//! - A [`TargetExecutor`] runs a [`Connector`] per available target. The
//!   connector dials, performs the watch handshake and announces a
//!   [`Client`] for as long as the stream stays open.
//! - A [`ClientExecutor`] runs an [`Inspector`] per client, which announces
//!   each hosted application as a [`RemoteApplication`].
//!
//! The observer sets fan each stage out to any number of observers.
//! Everything is cancelled cooperatively through
//! `tokio_util::sync::CancellationToken`.

pub mod application;
pub mod backoff;
pub mod client;
pub mod connector;
pub mod discoverer;
pub mod error;
pub mod executor;
pub mod inspector;
pub mod mock;
pub mod observer;
pub mod target;
pub mod transport;

pub use application::ApplicationObserver;
pub use application::RemoteApplication;
pub use backoff::Backoff;
pub use client::Client;
pub use client::ClientId;
pub use client::ClientObserver;
pub use connector::Connector;
pub use discoverer::StaticTargetDiscoverer;
pub use error::Error;
pub use error::Result;
pub use executor::ClientExecutor;
pub use executor::Executor;
pub use executor::TargetExecutor;
pub use inspector::Inspector;
pub use observer::ApplicationObserverSet;
pub use observer::ClientObserverSet;
pub use observer::TargetObserverSet;
pub use target::DialOptions;
pub use target::Target;
pub use target::TargetObserver;
pub use transport::Connection;
pub use transport::Dialer;
pub use transport::WatchStream;
