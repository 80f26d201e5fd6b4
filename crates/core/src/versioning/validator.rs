use crate::versioning::ItemKind;
use crate::MdrResult;

/// Lookups into stored library items used by value-object validation.
///
/// Only live (not deleted) items are visible through a validator.
pub trait ReferenceValidator {
    /// True if some item of `kind` has, in its latest version, every `(field, value)` pair of
    /// `criteria` as a top-level string field.
    fn exists_by(&self, kind: ItemKind, criteria: &[(&str, &str)]) -> MdrResult<bool>;

    fn item_exists(&self, kind: ItemKind, uid: &str) -> MdrResult<bool>;

    /// Template parameters are the codelist names of stored CT terms.
    fn template_parameter_exists(&self, name: &str) -> MdrResult<bool> {
        self.exists_by(ItemKind::CtTerm, &[("codelist_name", name)])
    }
}
