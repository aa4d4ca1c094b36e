//! Canonical UUID wrapper and sharded-path derivation.

use crate::{UuidError, UuidResult};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Medico's canonical UUID representation (32 lowercase hex characters, no hyphens).
///
/// This wrapper type guarantees that once constructed, the contained UUID is in canonical
/// format. It is the type the file-backed store uses to derive a case directory.
///
/// # Construction
/// - [`ShardableUuid::new`] generates a new canonical UUID.
/// - [`ShardableUuid::parse`] validates an externally supplied identifier.
///
/// # Display format
/// When displayed or converted to string, `ShardableUuid` always produces the canonical
/// 32-character lowercase hex format without hyphens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardableUuid(Uuid);

impl Default for ShardableUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl ShardableUuid {
    /// Generates a new random (v4) UUID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses a UUID string that must already be in canonical form.
    ///
    /// This does **not** normalise other common UUID forms (for example, hyphenated or
    /// uppercase). Callers must provide the canonical representation.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "UUID must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("invalid UUID '{}': {}", input, e)))
    }

    /// Returns true if `input` is in canonical UUID form.
    ///
    /// Purely syntactic: exactly 32 bytes, lowercase hex only.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<uuid>/` where `s1`/`s2` are derived from this UUID.
    ///
    /// - `s1` is the first two hex characters of the UUID
    /// - `s2` is the next two hex characters
    /// - The full UUID forms the leaf directory
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2).join(&canonical)
    }
}

impl fmt::Display for ShardableUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for ShardableUuid {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShardableUuid::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ShardableUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ShardableUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ShardableUuid::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_generates_canonical_uuid() {
        let canonical = ShardableUuid::new().to_string();

        assert_eq!(canonical.len(), 32);
        assert!(ShardableUuid::is_canonical(&canonical));
    }

    #[test]
    fn test_parse_valid_canonical_uuid() {
        let canonical = "550e8400e29b41d4a716446655440000";
        let result = ShardableUuid::parse(canonical);

        assert!(result.is_ok());
        assert_eq!(result.unwrap().to_string(), canonical);
    }

    #[test]
    fn test_parse_rejects_hyphenated_uuid() {
        let result = ShardableUuid::parse("550e8400-e29b-41d4-a716-446655440000");

        match result {
            Err(UuidError::InvalidInput(msg)) => {
                assert!(msg.contains("32 lowercase hex characters"));
            }
            _ => panic!("Expected InvalidInput error"),
        }
    }

    #[test]
    fn test_parse_rejects_uppercase_and_short_input() {
        assert!(ShardableUuid::parse("550E8400E29B41D4A716446655440000").is_err());
        assert!(ShardableUuid::parse("550e8400e29b41d4a71644665544000").is_err());
    }

    #[test]
    fn test_sharded_dir_layout() {
        let temp = TempDir::new().unwrap();
        let id = ShardableUuid::parse("550e8400e29b41d4a716446655440000").unwrap();

        let dir = id.sharded_dir(temp.path());

        assert_eq!(
            dir,
            temp.path()
                .join("55")
                .join("0e")
                .join("550e8400e29b41d4a716446655440000")
        );
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let id = ShardableUuid::parse("550e8400e29b41d4a716446655440000").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"550e8400e29b41d4a716446655440000\"");

        let back: ShardableUuid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
