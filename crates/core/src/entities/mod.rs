//! Entity value objects stored as library items.
//!
//! Each value object implements [`LibraryItemValue`](crate::versioning::LibraryItemValue) and
//! carries its own business validation. Checks against other stored items go through a
//! [`ReferenceValidator`].

mod activity;
mod activity_group;
mod ct_term;
mod odm_form;
mod syntax_template;

pub use activity::ActivityVO;
pub use activity_group::ActivityGroupVO;
pub use ct_term::CtTermAttributesVO;
pub use odm_form::OdmFormVO;
pub use syntax_template::SyntaxTemplateVO;

use crate::versioning::{ItemKind, ReferenceValidator};
use crate::{MdrError, MdrResult};

/// Checks shared by concepts that carry a display name and a sentence-case name.
pub(crate) fn validate_names(name: &str, name_sentence_case: &str) -> MdrResult<()> {
    if name.trim().is_empty() {
        return Err(MdrError::Validation("name must not be empty".into()));
    }
    if name.to_lowercase() != name_sentence_case.to_lowercase() {
        return Err(MdrError::Validation(format!(
            "Lowercase versions of '{name}' and '{name_sentence_case}' must be equal"
        )));
    }
    Ok(())
}

/// Fail with [`MdrError::AlreadyExists`] if another item of `kind` already uses `value`.
///
/// Skipped when the field is unchanged from `previous`.
pub(crate) fn ensure_unique(
    validator: &dyn ReferenceValidator,
    kind: ItemKind,
    field: &str,
    value: &str,
    previous: Option<&str>,
) -> MdrResult<()> {
    if previous == Some(value) {
        return Ok(());
    }
    if validator.exists_by(kind, &[(field, value)])? {
        return Err(MdrError::AlreadyExists(format!(
            "{kind} with {field} ({value}) already exists."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::testing::FakeValidator;

    #[test]
    fn sentence_case_must_match_name() {
        assert!(validate_names("Body Weight", "body weight").is_ok());
        assert!(matches!(
            validate_names("Body Weight", "height"),
            Err(MdrError::Validation(_))
        ));
        assert!(validate_names("  ", "").is_err());
    }

    #[test]
    fn unchanged_field_skips_uniqueness() {
        let v = FakeValidator::default().with_item(ItemKind::Activity, "u1", &[("name", "A")]);
        assert!(ensure_unique(&v, ItemKind::Activity, "name", "A", Some("A")).is_ok());
        let err = ensure_unique(&v, ItemKind::Activity, "name", "A", None).unwrap_err();
        assert_eq!(err.to_string(), "Activity with name (A) already exists.");
    }
}
