use super::{ensure_unique, validate_names};
use crate::versioning::{ItemKind, LibraryItemValue, ReferenceValidator};
use crate::{MdrError, MdrResult};
use serde::{Deserialize, Serialize};

/// A clinical activity, e.g. a measurement or assessment, filed under activity groups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivityVO {
    pub name: String,
    pub name_sentence_case: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nci_concept_id: Option<String>,
    #[serde(default)]
    pub activity_group_uids: Vec<String>,
    #[serde(default)]
    pub is_data_collected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_rationale: Option<String>,
}

impl ActivityVO {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            name_sentence_case: name.to_lowercase(),
            definition: None,
            abbreviation: None,
            nci_concept_id: None,
            activity_group_uids: Vec::new(),
            is_data_collected: false,
            request_rationale: None,
        }
    }

    pub fn with_groups(mut self, group_uids: &[&str]) -> Self {
        self.activity_group_uids = group_uids.iter().map(|g| g.to_string()).collect();
        self
    }
}

impl LibraryItemValue for ActivityVO {
    const KIND: ItemKind = ItemKind::Activity;

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
        )?;

        for group_uid in &self.activity_group_uids {
            if !validator.item_exists(ItemKind::ActivityGroup, group_uid)? {
                return Err(MdrError::BusinessLogic(format!(
                    "Activity tried to connect to non-existent Activity Group ({group_uid})."
                )));
            }
        }

        if self
            .nci_concept_id
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            return Err(MdrError::Validation(
                "nci_concept_id must not be blank when given".into(),
            ));
        }
        Ok(())
    }
}
