//! # Configwire
//!
//! A binary encoding of application configurations, used to describe the
//! applications hosted by a process to remote peers.
//!
//! ## Layers
//!
//! - [`codec`]: a bounded TLV encoder and a zero-copy decoder.
//! - [`frame`]: application and handler frames in two versions. Decoding
//!   accepts either; encoding takes an explicit [`Version`].
//!
//! Decoded configurations carry message names only, never Rust types.

pub mod codec;
pub mod error;
pub mod frame;


pub use error::Error;
pub use error::Result;
pub use frame::Version;
pub use frame::decode_application;
pub use frame::decode_applications;
pub use frame::encode_application;
pub use frame::encode_applications;
