//! # Entity Identity
//!
//! An [`Identity`] is the validated `(name, key)` pair that uniquely identifies
//! an application or handler. Names are human-readable; keys are UUIDs that stay
//! stable across renames.

use std::fmt;

use unicode_general_category::GeneralCategory;
use unicode_general_category::get_general_category;
use uuid::Uuid;

/// Identity validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid name {0:?}, names must be non-empty, printable UTF-8 strings with no whitespace")]
    InvalidName(String),
    #[error("invalid key {0:?}, keys must be RFC 4122 UUIDs")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The name and key of an application or handler.
///
/// The default value is the zero identity, used to mean "not yet configured".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    name: String,
    key: String,
}

impl Identity {
    /// Validates `name` and `key` and returns the identity they form.
    ///
    /// The key is stored in canonical lowercase hyphenated form.
    pub fn new(name: impl Into<String>, key: impl AsRef<str>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        let key = validate_key(key.as_ref())?;

        Ok(Self { name, key: key.hyphenated().to_string() })
    }

    /// Like [`Identity::new`], but aborts via [`crate::abort`] on invalid input.
    ///
    /// Meant for fixtures and other contexts where an invalid identity is a
    /// programming error. Inside `configure()` the abort is caught by the builder.
    pub fn must_new(name: impl Into<String>, key: impl AsRef<str>) -> Self {
        Self::new(name, key).unwrap_or_else(|e| crate::abort(e.into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the key as a UUID, or `None` for the zero identity.
    pub fn key_uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.key).ok()
    }

    /// Returns true if this is the zero identity.
    pub fn is_zero(&self) -> bool {
        self.name.is_empty() && self.key.is_empty()
    }

    /// Returns true if the identities share a name or a key.
    pub fn conflicts_with(&self, other: &Identity) -> bool {
        self.name == other.name || self.key == other.key
    }

    /// Re-validates an identity, e.g. one assembled from decoded data.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_key(&self.key)?;
        Ok(())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.key)
    }
}

/// Checks that `name` is non-empty, printable and free of whitespace.
///
/// Printable means a letter, mark, number, punctuation or symbol. Separators,
/// control and format characters, private-use, surrogate and unassigned code
/// points are all rejected.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(is_printable) {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

fn is_printable(c: char) -> bool {
    !c.is_whitespace()
        && !matches!(
            get_general_category(c),
            GeneralCategory::SpaceSeparator
                | GeneralCategory::LineSeparator
                | GeneralCategory::ParagraphSeparator
                | GeneralCategory::Control
                | GeneralCategory::Format
                | GeneralCategory::Surrogate
                | GeneralCategory::PrivateUse
                | GeneralCategory::Unassigned
        )
}

/// Checks that `key` is a UUID and returns it parsed.
pub fn validate_key(key: &str) -> Result<Uuid> {
    Uuid::parse_str(key).map_err(|_| Error::InvalidKey(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const KEY_A: &str = "0d4f5d6e-7a49-4c76-a87e-b8a4a1f0f6e1";
    const KEY_B: &str = "a38a9a0c-1bd2-4a41-b2b6-c0c1d8b0a3a4";

    #[test]
    fn test_new_accepts_valid_identity() {
        let id = Identity::new("name", KEY_A).unwrap();
        assert_eq!(id.name(), "name");
        assert_eq!(id.key(), KEY_A);
        assert!(!id.is_zero());
        assert_eq!(id.to_string(), format!("name ({KEY_A})"));
    }

    #[test]
    fn test_new_canonicalizes_key() {
        let id = Identity::new("name", KEY_A.to_uppercase()).unwrap();
        assert_eq!(id.key(), KEY_A);
    }

    #[test]
    fn test_new_rejects_invalid_names() {
        for name in ["", "with space", "tab\there", "new\nline", "bell\u{7}"] {
            let err = Identity::new(name, KEY_A).unwrap_err();
            assert_eq!(err, Error::InvalidName(name.to_string()));
        }
    }

    #[test]
    fn test_new_rejects_invalid_keys() {
        for key in ["", "not-a-uuid", "0d4f5d6e-7a49"] {
            let err = Identity::new("name", key).unwrap_err();
            assert_eq!(err, Error::InvalidKey(key.to_string()));
        }
    }

    #[test]
    fn test_error_text_names_offending_value() {
        let err = Identity::new("bad name", KEY_A).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"invalid name "bad name", names must be non-empty, printable UTF-8 strings with no whitespace"#,
        );
    }

    #[test]
    fn test_must_new_aborts_with_config_error() {
        let result = crate::recover(|| Ok(Identity::must_new("", KEY_A)));
        assert_eq!(result, Err(crate::Error::from(Error::InvalidName(String::new()))));
    }

    #[test]
    fn test_zero_identity() {
        assert!(Identity::default().is_zero());
        assert_eq!(Identity::default().key_uuid(), None);
    }

    #[test]
    fn test_conflicts_with() {
        let a = Identity::new("a", KEY_A).unwrap();
        assert!(a.conflicts_with(&Identity::new("a", KEY_B).unwrap()));
        assert!(a.conflicts_with(&Identity::new("b", KEY_A).unwrap()));
        assert!(!a.conflicts_with(&Identity::new("b", KEY_B).unwrap()));
    }

    #[test]
    fn test_new_rejects_non_printable_names() {
        let names = [
            "a\u{200B}b",  // zero-width space (Cf)
            "\u{FEFF}name", // byte order mark (Cf)
            "x\u{E000}",   // private use (Co)
            "y\u{0378}",   // unassigned (Cn)
            "nb\u{00A0}sp", // no-break space (Zs)
            "line\u{2028}", // line separator (Zl)
            "next\u{0085}", // next line (Cc)
        ];
        for name in names {
            assert_eq!(Identity::new(name, KEY_A), Err(Error::InvalidName(name.to_string())), "{name:?}");
        }
    }

    #[test]
    fn test_new_accepts_printable_unicode_names() {
        for name in ["café", "名前", "e\u{0301}", "a::b", "ß-2", "€", "🦀"] {
            assert!(Identity::new(name, KEY_A).is_ok(), "{name:?}");
        }
    }

    const REJECTED: &[char] = &[' ', '\t', '\n', '\u{7}', '\u{85}', '\u{A0}', '\u{200B}', '\u{2029}', '\u{FEFF}', '\u{E000}', '\u{0378}'];

    proptest! {
        #[test]
        fn prop_plain_names_are_accepted(name in "[A-Za-z0-9_.:/-]{1,32}") {
            prop_assert!(Identity::new(name, KEY_A).is_ok());
        }

        #[test]
        fn prop_any_rejected_char_invalidates_name(
            prefix in "[a-z]{0,8}",
            suffix in "[a-z]{0,8}",
            bad in proptest::sample::select(REJECTED),
        ) {
            let name = format!("{prefix}{bad}{suffix}");
            prop_assert_eq!(Identity::new(name.clone(), KEY_A), Err(Error::InvalidName(name)));
        }

        #[test]
        fn prop_key_validity(key in ".*") {
            prop_assert_eq!(Identity::new("name", &key).is_ok(), Uuid::parse_str(&key).is_ok());
        }

        #[test]
        fn prop_uuid_keys_are_accepted(bytes in any::<[u8; 16]>()) {
            let key = Uuid::from_bytes(bytes).to_string();
            prop_assert!(Identity::new("name", key).is_ok());
        }
    }
}
