//! The acting author of a library item change.

use crate::constants::DEFAULT_AUTHOR_EMAIL;
use crate::{MdrError, MdrResult};
use mdr_types::NonEmptyText;

/// Represents the author of a commit or library operation.
///
/// The name is recorded in item metadata and in the `Author-Name` commit trailer; the email is
/// only used for the git signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Author {
    pub name: NonEmptyText,
    pub email: Option<NonEmptyText>,
}

impl Author {
    pub fn new(name: impl AsRef<str>, email: Option<&str>) -> MdrResult<Self> {
        let name = NonEmptyText::single_line(name)
            .map_err(|e| MdrError::Validation(format!("author name: {e}")))?;
        let email = match email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(e) => Some(
                NonEmptyText::single_line(e)
                    .map_err(|err| MdrError::Validation(format!("author email: {err}")))?,
            ),
            None => None,
        };
        Ok(Self { name, email })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Email for the git signature, with a placeholder when none was given.
    pub fn signature_email(&self) -> &str {
        self.email
            .as_ref()
            .map(NonEmptyText::as_str)
            .unwrap_or(DEFAULT_AUTHOR_EMAIL)
    }

    /// Validate the author before any commit is created.
    ///
    /// Git signatures reject `<` and `>` in names and emails.
    pub(crate) fn validate_commit_author(&self) -> MdrResult<()> {
        let bad = |s: &str| s.contains(['<', '>']);
        if bad(self.name()) || bad(self.signature_email()) {
            return Err(MdrError::Validation(
                "author name and email must not contain '<' or '>'".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_email_is_treated_as_missing() {
        let author = Author::new("Jane Doe", Some("  ")).unwrap();
        assert!(author.email.is_none());
        assert_eq!(author.signature_email(), DEFAULT_AUTHOR_EMAIL);
    }

    #[test]
    fn rejects_empty_name() {
        assert!(matches!(
            Author::new("   ", None),
            Err(MdrError::Validation(_))
        ));
    }

    #[test]
    fn commit_author_rejects_angle_brackets() {
        let author = Author::new("Jane <admin>", None).unwrap();
        assert!(author.validate_commit_author().is_err());
    }
}
