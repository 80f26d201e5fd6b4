use crate::versioning::{ItemKind, LibraryItemValue, ReferenceValidator};
use crate::{MdrError, MdrResult};
use serde::{Deserialize, Serialize};

/// Attributes of a controlled terminology term within one codelist.
///
/// The `codelist_name` of stored terms doubles as the set of template parameter names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CtTermAttributesVO {
    pub codelist_uid: String,
    pub codelist_name: String,
    pub catalogue_name: String,
    pub code_submission_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_submission_value: Option<String>,
    pub preferred_term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl CtTermAttributesVO {
    pub fn new(
        codelist_uid: &str,
        codelist_name: &str,
        catalogue_name: &str,
        code_submission_value: &str,
        preferred_term: &str,
    ) -> Self {
        Self {
            codelist_uid: codelist_uid.to_string(),
            codelist_name: codelist_name.to_string(),
            catalogue_name: catalogue_name.to_string(),
            code_submission_value: code_submission_value.to_string(),
            name_submission_value: None,
            preferred_term: preferred_term.to_string(),
            definition: None,
        }
    }
}

impl LibraryItemValue for CtTermAttributesVO {
    const KIND: ItemKind = ItemKind::CtTerm;

    fn name(&self) -> &str {
        &self.preferred_term
    }

    fn validate(
        &self,
        validator: &dyn ReferenceValidator,
        previous: Option<&Self>,
    ) -> MdrResult<()> {
        for (field, value) in [
            ("codelist_uid", &self.codelist_uid),
            ("codelist_name", &self.codelist_name),
            ("catalogue_name", &self.catalogue_name),
            ("code_submission_value", &self.code_submission_value),
            ("preferred_term", &self.preferred_term),
        ] {
            if value.trim().is_empty() {
                return Err(MdrError::Validation(format!("{field} must not be empty")));
            }
        }

        let submission_changed = previous.map_or(true, |p| {
            p.code_submission_value != self.code_submission_value
                || p.codelist_uid != self.codelist_uid
        });
        if submission_changed
            && validator.exists_by(
                Self::KIND,
                &[
                    ("codelist_uid", &self.codelist_uid),
                    ("code_submission_value", &self.code_submission_value),
                ],
            )?
        {
            return Err(MdrError::AlreadyExists(format!(
                "CT Term with code_submission_value ({}) already exists in codelist ({}).",
                self.code_submission_value, self.codelist_uid
            )));
        }

        super::ensure_unique(
            validator,
            Self::KIND,
            "preferred_term",
            &self.preferred_term,
            previous.map(|p| p.preferred_term.as_str()),
        )
    }

    /// Sponsor-preferred attributes of terms in published terminologies remain maintainable.
    fn edit_allowed_in_non_editable_library() -> bool {
        true
    }
}
