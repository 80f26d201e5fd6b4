//! Entity value objects carried by library item aggregates.

use crate::versioning::ReferenceValidator;
use crate::MdrResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of library item the MDR stores.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Activity,
    ActivityGroup,
    CtTerm,
    OdmForm,
    SyntaxTemplate,
}

impl ItemKind {
    pub const ALL: [ItemKind; 5] = [
        Self::Activity,
        Self::ActivityGroup,
        Self::CtTerm,
        Self::OdmForm,
        Self::SyntaxTemplate,
    ];

    /// Directory under the data directory holding items of this kind.
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Activity => "activities",
            Self::ActivityGroup => "activity_groups",
            Self::CtTerm => "ct_terms",
            Self::OdmForm => "odm_forms",
            Self::SyntaxTemplate => "syntax_templates",
        }
    }

    /// Collection path segment used by the HTTP API.
    pub const fn route_name(self) -> &'static str {
        match self {
            Self::Activity => "activities",
            Self::ActivityGroup => "activity-groups",
            Self::CtTerm => "ct-terms",
            Self::OdmForm => "odm-forms",
            Self::SyntaxTemplate => "syntax-templates",
        }
    }

    /// Commit message domain, e.g. `activity:approve: ...`.
    pub const fn commit_domain(self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::ActivityGroup => "activity-group",
            Self::CtTerm => "ct-term",
            Self::OdmForm => "odm-form",
            Self::SyntaxTemplate => "syntax-template",
        }
    }

    /// Human readable name used in error messages.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Activity => "Activity",
            Self::ActivityGroup => "Activity Group",
            Self::CtTerm => "CT Term",
            Self::OdmForm => "ODM Form",
            Self::SyntaxTemplate => "Syntax Template",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// An entity value object held by a [`crate::versioning::LibraryItem`].
///
/// Values are immutable bundles of attributes. An edit replaces the value wholesale and
/// equality is used to detect edits that change nothing.
pub trait LibraryItemValue:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: ItemKind;

    fn name(&self) -> &str;

    /// Business validation of this value.
    ///
    /// `previous` is the value being replaced, if any. Uniqueness is only checked for fields
    /// that differ from `previous`.
    fn validate(
        &self,
        validator: &dyn ReferenceValidator,
        previous: Option<&Self>,
    ) -> MdrResult<()>;

    /// Whether existing items of this kind may change while their library is not editable.
    fn edit_allowed_in_non_editable_library() -> bool {
        false
    }

    /// Fill derived fields of raw client input before it is deserialised.
    fn prepare_input(_input: &mut serde_json::Map<String, serde_json::Value>) {}
}
