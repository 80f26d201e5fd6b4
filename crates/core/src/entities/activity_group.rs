use super::{ensure_unique, validate_names};
use crate::versioning::{ItemKind, LibraryItemValue, ReferenceValidator};
use crate::MdrResult;
use serde::{Deserialize, Serialize};

/// Grouping concept that activities are filed under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivityGroupVO {
    pub name: String,
    pub name_sentence_case: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
}

impl ActivityGroupVO {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            name_sentence_case: name.to_lowercase(),
            definition: None,
            abbreviation: None,
        }
    }
}

impl LibraryItemValue for ActivityGroupVO {
    const KIND: ItemKind = ItemKind::ActivityGroup;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(
        &self,
        validator: &dyn ReferenceValidator,
        previous: Option<&Self>,
    ) -> MdrResult<()> {
        validate_names(&self.name, &self.name_sentence_case)?;
        ensure_unique(
            validator,
            Self::KIND,
            "name",
            &self.name,
            previous.map(|p| p.name.as_str()),
        )
    }
}
