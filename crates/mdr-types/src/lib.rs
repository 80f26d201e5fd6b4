//! Validated primitive types shared across the MDR crates.
//!
//! - [`NonEmptyText`]: trimmed text that is guaranteed to contain something (library names,
//!   author names, change descriptions).
//! - [`VersionNumber`]: a `major.minor` library item version label.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input was expected to fit on a single line
    #[error("Text must be a single line")]
    MultiLine,
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`], but also rejects embedded line breaks.
    ///
    /// Used for values that end up in commit subjects and trailers.
    pub fn single_line(input: impl AsRef<str>) -> Result<Self, TextError> {
        let text = Self::new(input)?;
        if text.0.contains(['\n', '\r']) {
            return Err(TextError::MultiLine);
        }
        Ok(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors produced when parsing a [`VersionNumber`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("version must have the form <major>.<minor>, got '{0}'")]
    Malformed(String),
    #[error("version 0.0 does not exist")]
    Zero,
}

/// A library item version label, rendered as `"{major}.{minor}"`.
///
/// Ordering is numeric: `1.10` sorts after `1.9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
}

impl VersionNumber {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for VersionNumber {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || VersionError::Malformed(s.to_string());
        let (major, minor) = s.trim().split_once('.').ok_or_else(malformed)?;
        let major: u32 = major.parse().map_err(|_| malformed())?;
        let minor: u32 = minor.parse().map_err(|_| malformed())?;
        if major == 0 && minor == 0 {
            return Err(VersionError::Zero);
        }
        Ok(Self { major, minor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Sponsor  ").unwrap();
        assert_eq!(text.as_str(), "Sponsor");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new(" \t\n").unwrap_err(), TextError::Empty);
    }

    #[test]
    fn single_line_rejects_line_breaks() {
        assert_eq!(
            NonEmptyText::single_line("Approved\nversion").unwrap_err(),
            TextError::MultiLine
        );
    }

    #[test]
    fn non_empty_text_deserialize_rejects_empty() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"   \"");
        assert!(result.is_err());
    }

    #[test]
    fn version_number_parses_and_displays() {
        let v: VersionNumber = "1.12".parse().unwrap();
        assert_eq!(v, VersionNumber::new(1, 12));
        assert_eq!(v.to_string(), "1.12");
    }

    #[test]
    fn version_number_orders_numerically() {
        let a: VersionNumber = "1.9".parse().unwrap();
        let b: VersionNumber = "1.10".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn version_number_rejects_garbage() {
        assert!(matches!(
            "one.two".parse::<VersionNumber>(),
            Err(VersionError::Malformed(_))
        ));
        assert!(matches!(
            "3".parse::<VersionNumber>(),
            Err(VersionError::Malformed(_))
        ));
        assert_eq!("0.0".parse::<VersionNumber>(), Err(VersionError::Zero));
    }
}
