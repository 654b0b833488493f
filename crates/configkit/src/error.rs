//! # Configuration Errors
//!
//! Every structural violation found while building a configuration is reported
//! as an [`Error`]. Configurer methods return them directly so `configure()`
//! implementations can propagate with `?`; code that cannot return a `Result`
//! (fixtures, `Identity::must_new`) raises them with [`abort`] instead, and the
//! builders catch that abort with [`recover`].

use std::cell::Cell;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Once;

/// A configuration error.
///
/// The `Display` text is a single sentence naming the offending type, the
/// offending call and, where one exists, the previously recorded value that
/// it conflicts with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A name or key is malformed.
    #[error("{}", invalid_identity(.entity.as_deref(), .source))]
    InvalidIdentity {
        /// Description of the entity being configured, if any.
        entity: Option<String>,
        source: crate::identity::Error,
    },
    /// A configurer method was called more than once for the same fact.
    #[error("{0}")]
    DuplicateDeclaration(String),
    /// A message type is used under two different roles.
    #[error("{0}")]
    RoleConflict(String),
    /// A required declaration was never made.
    #[error("{0}")]
    Incomplete(String),
    /// Two entities in one application share a name or a key.
    #[error("{0}")]
    IdentityCollision(String),
    /// A command is consumed, or an event produced, by more than one handler.
    #[error("{0}")]
    SingleOwnerViolation(String),
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidIdentity,
    DuplicateDeclaration,
    RoleConflict,
    Incomplete,
    IdentityCollision,
    SingleOwnerViolation,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIdentity { .. } => ErrorKind::InvalidIdentity,
            Self::DuplicateDeclaration(_) => ErrorKind::DuplicateDeclaration,
            Self::RoleConflict(_) => ErrorKind::RoleConflict,
            Self::Incomplete(_) => ErrorKind::Incomplete,
            Self::IdentityCollision(_) => ErrorKind::IdentityCollision,
            Self::SingleOwnerViolation(_) => ErrorKind::SingleOwnerViolation,
        }
    }
}

impl From<crate::identity::Error> for Error {
    fn from(source: crate::identity::Error) -> Self {
        Self::InvalidIdentity { entity: None, source }
    }
}

fn invalid_identity(entity: Option<&str>, source: &crate::identity::Error) -> String {
    match entity {
        Some(entity) => format!("{entity} is configured with an invalid identity, {source}"),
        None => source.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

thread_local! {
    /// Number of [`recover`] calls active on this thread.
    static RECOVERING: Cell<usize> = const { Cell::new(0) };
}

static QUIET_ABORTS: Once = Once::new();

/// Wraps the current panic hook so that an [`abort`] caught by [`recover`]
/// on the same thread prints nothing. Every other panic reaches the previous
/// hook unchanged.
fn install_quiet_hook() {
    QUIET_ABORTS.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let caught = info.payload().is::<Error>() && recovering();
            if !caught {
                previous(info);
            }
        }));
    });
}

pub(crate) fn recovering() -> bool {
    RECOVERING.with(|depth| depth.get() > 0)
}

struct RecoverScope;

impl RecoverScope {
    fn enter() -> Self {
        RECOVERING.with(|depth| depth.set(depth.get() + 1));
        Self
    }
}

impl Drop for RecoverScope {
    fn drop(&mut self) {
        RECOVERING.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Unwinds to the nearest [`recover`] boundary carrying `err`.
///
/// Outside a [`recover`] call this is an ordinary panic and is reported by
/// the panic hook as usual.
pub fn abort(err: Error) -> ! {
    panic::panic_any(err)
}

/// Calls `f`, converting an [`abort`] raised inside it into `Err`.
///
/// Panics that do not carry an [`Error`] are resumed unmodified. Caught
/// aborts are not reported by the panic hook.
pub fn recover<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    install_quiet_hook();
    let outcome = {
        let _scope = RecoverScope::enter();
        panic::catch_unwind(AssertUnwindSafe(f))
    };
    match outcome {
        Ok(result) => result,
        Err(payload) => match payload.downcast::<Error>() {
            Ok(err) => Err(*err),
            Err(payload) => panic::resume_unwind(payload),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recover_converts_abort() {
        let err = Error::Incomplete("nothing here".into());
        let result: Result<()> = recover(|| abort(err.clone()));
        assert_eq!(result, Err(err));
    }

    #[test]
    fn test_recover_passes_through_values() {
        assert_eq!(recover(|| Ok(42)), Ok(42));
        let err = Error::RoleConflict("returned".into());
        assert_eq!(recover::<()>(|| Err(err.clone())), Err(err));
    }

    #[test]
    #[should_panic(expected = "genuine bug")]
    fn test_recover_resumes_foreign_panics() {
        let _ = recover::<()>(|| panic!("genuine bug"));
    }

    #[test]
    fn test_nested_recover_is_scoped() {
        let outer: Result<u32> = recover(|| {
            let inner: Result<u32> = recover(|| abort(Error::Incomplete("inner".into())));
            assert!(inner.is_err());
            Ok(7)
        });
        assert_eq!(outer, Ok(7));
    }

    #[test]
    fn test_recover_scope_ends_with_the_call() {
        assert!(!recovering());
        let result: Result<()> = recover(|| {
            assert!(recovering());
            abort(Error::Incomplete("scoped".into()))
        });
        assert!(result.is_err());
        assert!(!recovering());
    }

    #[test]
    fn test_recover_scope_ends_after_foreign_panic() {
        let outer = std::panic::catch_unwind(|| recover::<()>(|| panic!("not ours")));
        assert!(outer.is_err());
        assert!(!recovering());
    }

    #[test]
    fn test_invalid_identity_message() {
        let source = crate::identity::Error::InvalidName(" ".into());
        let err = Error::InvalidIdentity { entity: Some("app::Thing".into()), source: source.clone() };
        assert_eq!(
            err.to_string(),
            format!("app::Thing is configured with an invalid identity, {source}"),
        );
        assert_eq!(Error::from(source.clone()).to_string(), source.to_string());
        assert_eq!(err.kind(), ErrorKind::InvalidIdentity);
    }
}
