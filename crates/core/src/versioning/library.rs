use crate::{MdrError, MdrResult};
use serde::{Deserialize, Serialize};

/// The content library owning a library item, e.g. "Sponsor" or "CDISC".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryVO {
    name: String,
    is_editable: bool,
}

impl LibraryVO {
    /// Build a library reference from client input.
    ///
    /// `is_library_editable` resolves the editability of a library by name and returns `None`
    /// when the library cannot be resolved.
    pub fn from_input_values(
        library_name: &str,
        is_library_editable: impl FnOnce(&str) -> MdrResult<Option<bool>>,
    ) -> MdrResult<Self> {
        match is_library_editable(library_name)? {
            Some(is_editable) => Ok(Self {
                name: library_name.to_string(),
                is_editable,
            }),
            None => Err(MdrError::BusinessLogic(format!(
                "Can't infer if library: {library_name} is editable because the library could not be resolved."
            ))),
        }
    }

    pub fn from_repository_values(name: impl Into<String>, is_editable: bool) -> Self {
        Self {
            name: name.into(),
            is_editable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_editable(&self) -> bool {
        self.is_editable
    }
}
