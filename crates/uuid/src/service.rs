//! Canonical uid wrapper.

use crate::{UuidError, UuidResult};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// The MDR's canonical uid representation (32 lowercase hex characters, no hyphens).
///
/// Once constructed, the contained UUID is known to be valid and renders canonically.
///
/// # Construction
/// - [`UuidService::new`] generates a fresh uid (the repository's `generate_uid` callback).
/// - [`UuidService::parse`] validates an externally supplied uid (path parameters, references
///   between items).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UuidService(Uuid);

impl Default for UuidService {
    fn default() -> Self {
        Self::new()
    }
}

impl UuidService {
    /// Generates a new random (v4) uid.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates a uid string that must already be in canonical form.
    ///
    /// Hyphenated or uppercase forms are rejected rather than normalised, so that one item
    /// can never be addressed through two different strings.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not canonical.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "uid must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(e.to_string()))
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is in canonical form. Purely syntactic.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<uid>/`.
    ///
    /// `s1` is the first two hex characters of the uid and `s2` the next two.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2).join(&canonical)
    }
}

impl fmt::Display for UuidService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for UuidService {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UuidService::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for UuidService {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for UuidService {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        UuidService::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_canonical_uid() {
        let uid = UuidService::new().to_string();
        assert_eq!(uid.len(), 32);
        assert!(UuidService::is_canonical(&uid));
    }

    #[test]
    fn parse_accepts_canonical_uid() {
        let canonical = "550e8400e29b41d4a716446655440000";
        assert_eq!(UuidService::parse(canonical).unwrap().to_string(), canonical);
    }

    #[test]
    fn parse_rejects_hyphenated_and_uppercase() {
        assert!(UuidService::parse("550e8400-e29b-41d4-a716-446655440000").is_err());
        assert!(UuidService::parse("550E8400E29B41D4A716446655440000").is_err());
    }

    #[test]
    fn parse_error_explains_expected_form() {
        match UuidService::parse("Activity_000001") {
            Err(UuidError::InvalidInput(msg)) => assert!(msg.contains("32 lowercase hex")),
            Ok(_) => panic!("expected parse failure"),
        }
    }

    #[test]
    fn sharded_dir_uses_first_four_hex_characters() {
        let uid = UuidService::parse("550e8400e29b41d4a716446655440000").unwrap();
        let dir = uid.sharded_dir(Path::new("/data/activities"));
        assert_eq!(
            dir,
            PathBuf::from("/data/activities/55/0e/550e8400e29b41d4a716446655440000")
        );
    }

    #[test]
    fn serde_round_trips_through_canonical_string() {
        let uid = UuidService::parse("550e8400e29b41d4a716446655440000").unwrap();
        let json = serde_json::to_string(&uid).unwrap();
        assert_eq!(json, "\"550e8400e29b41d4a716446655440000\"");
        let back: UuidService = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uid);
    }
}
