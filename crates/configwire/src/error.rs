//! # Error Definitions
//!
//! Failures while encoding or decoding configurations. Structural codec
//! errors and configuration errors found in decoded data share one type so
//! that callers can propagate either with `?`.

use crate::codec::Scope;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Byte does not correspond to a valid tag, or the tag is not the one
    /// expected at this position.
    #[error("invalid tag byte {0:#04x}")]
    InvalidTag(u8),
    /// Input exhausted while reading.
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("string data is not valid UTF-8")]
    InvalidUtf8,
    /// Blob or container length exceeds `u32::MAX`.
    #[error("{0} bytes exceed the maximum blob length")]
    BlobTooLarge(usize),
    /// Closing a scope that does not match the open one.
    #[error("scope mismatch: expected {expected:?}, found {actual:?}")]
    ScopeMismatch { expected: Scope, actual: Scope },
    /// Closing a scope when only the root remains.
    #[error("no scope is open")]
    ScopeUnderflow,
    /// Finishing the buffer with scopes still open.
    #[error("a scope is still open")]
    ScopeStillOpen,
    /// A variant must carry exactly one payload item.
    #[error("a variant must hold exactly one item")]
    VariantArity,
    /// Only variants may be written directly into a map.
    #[error("only variants may be written into a map")]
    InvalidMapEntry,
    #[error("missing field {0:?}")]
    MissingField(&'static str),
    #[error("unknown {kind} value {value}")]
    UnknownValue { kind: &'static str, value: u8 },
    #[error("unsupported encoding version {0}")]
    UnsupportedVersion(u8),
    /// The data is well-formed but describes an impossible configuration.
    #[error("malformed configuration: {0}")]
    Malformed(String),
    /// The decoded configuration breaks a configuration rule.
    #[error(transparent)]
    Config(#[from] configkit::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
