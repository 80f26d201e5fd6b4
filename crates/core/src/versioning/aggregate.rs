//! The versioned library item aggregate root.
//!
//! A [`LibraryItem`] combines an identity (`uid`), the owning [`LibraryVO`], the metadata of
//! its current version and an entity value object. All lifecycle transitions go through the
//! methods here; repositories only load and persist aggregates.

use crate::author::Author;
use crate::constants::{
    APPROVED_VERSION_DESCRIPTION, INACTIVATED_VERSION_DESCRIPTION, NEW_DRAFT_DESCRIPTION,
    REACTIVATED_VERSION_DESCRIPTION,
};
use crate::versioning::{
    LibraryItemMetadataVO, LibraryItemStatus, LibraryItemValue, LibraryVO, ObjectAction,
    ReferenceValidator,
};
use crate::{MdrError, MdrResult};

/// Repository bookkeeping attached to aggregates loaded for update.
///
/// `head` is the version chain head observed at load time and acts as the optimistic lock
/// token. The stored metadata and value let the repository skip saves that change nothing.
#[derive(Clone, Debug, PartialEq)]
pub struct RepositoryClosure<V> {
    pub(crate) head: String,
    pub(crate) metadata: LibraryItemMetadataVO,
    pub(crate) value: V,
}

impl<V> RepositoryClosure<V> {
    pub fn head(&self) -> &str {
        &self.head
    }
}

#[derive(Clone, Debug)]
pub struct LibraryItem<V: LibraryItemValue> {
    uid: Option<String>,
    library: LibraryVO,
    item_metadata: LibraryItemMetadataVO,
    value: V,
    is_deleted: bool,
    persisted: bool,
    closure: Option<RepositoryClosure<V>>,
}

impl<V: LibraryItemValue> LibraryItem<V> {
    /// Create a new item in `library` at version `0.1`.
    ///
    /// # Errors
    ///
    /// - [`MdrError::BusinessLogic`] if the library is not editable.
    /// - Any error raised by the value's validation.
    pub fn from_input_values(
        author: &Author,
        value: V,
        library: LibraryVO,
        generate_uid: impl FnOnce() -> String,
        validator: &dyn ReferenceValidator,
    ) -> MdrResult<Self> {
        if !library.is_editable() {
            return Err(MdrError::BusinessLogic(
                "Creating objects in non-editable library is forbidden.".into(),
            ));
        }
        value.validate(validator, None)?;

        Ok(Self {
            uid: Some(generate_uid()),
            library,
            item_metadata: LibraryItemMetadataVO::initial(author),
            value,
            is_deleted: false,
            persisted: false,
            closure: None,
        })
    }

    /// Rebuild an aggregate from stored values. Pass a closure only when loading for update.
    pub fn from_repository_values(
        uid: String,
        value: V,
        library: LibraryVO,
        item_metadata: LibraryItemMetadataVO,
        closure: Option<RepositoryClosure<V>>,
    ) -> Self {
        Self {
            uid: Some(uid),
            library,
            item_metadata,
            value,
            is_deleted: false,
            persisted: true,
            closure,
        }
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    pub(crate) fn require_uid(&self) -> MdrResult<&str> {
        self.uid
            .as_deref()
            .ok_or_else(|| MdrError::BusinessLogic("Library item has no uid.".into()))
    }

    /// Assign the uid. A uid can only be set once.
    pub fn set_uid(&mut self, uid: impl Into<String>) -> MdrResult<()> {
        self.ensure_not_deleted()?;
        if self.uid.is_some() {
            return Err(MdrError::BusinessLogic("Cannot modify existing uid.".into()));
        }
        self.uid = Some(uid.into());
        Ok(())
    }

    pub fn name(&self) -> &str {
        self.value.name()
    }

    pub fn library(&self) -> &LibraryVO {
        &self.library
    }

    pub fn item_metadata(&self) -> &LibraryItemMetadataVO {
        &self.item_metadata
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn closure(&self) -> Option<&RepositoryClosure<V>> {
        self.closure.as_ref()
    }

    /// False until the item has been written by a repository.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub(crate) fn mark_saved(&mut self, closure: RepositoryClosure<V>) {
        self.persisted = true;
        self.closure = Some(closure);
    }

    fn ensure_not_deleted(&self) -> MdrResult<()> {
        if self.is_deleted {
            return Err(MdrError::BusinessLogic("Cannot use deleted object.".into()));
        }
        Ok(())
    }

    fn ensure_editable(&self) -> MdrResult<()> {
        self.ensure_not_deleted()?;
        if V::edit_allowed_in_non_editable_library() || self.library.is_editable() {
            return Ok(());
        }
        Err(MdrError::versioning_with_code(
            "Library is not editable.",
            "invalid_status_final",
        ))
    }

    /// Approve the current draft, producing the next major version.
    pub fn approve(&mut self, author: &Author, change_description: Option<&str>) -> MdrResult<()> {
        self.ensure_editable()?;
        if self.item_metadata.status() != LibraryItemStatus::Draft {
            return Err(MdrError::versioning_with_code(
                "Only DRAFT version can be approved.",
                "invalid_status_non_draft",
            ));
        }
        self.item_metadata = self.item_metadata.new_final_version(
            author,
            change_description.unwrap_or(APPROVED_VERSION_DESCRIPTION),
        )?;
        Ok(())
    }

    /// Start a new draft from the current final version.
    ///
    /// When `new_value` is given it is validated against the current value and replaces it.
    pub fn create_new_version(
        &mut self,
        author: &Author,
        change_description: Option<&str>,
        new_value: Option<V>,
        validator: &dyn ReferenceValidator,
    ) -> MdrResult<()> {
        self.ensure_editable()?;
        if self.item_metadata.status() != LibraryItemStatus::Final {
            return Err(MdrError::versioning_with_code(
                "New draft version can be created only for FINAL versions.",
                "invalid_status_non_final",
            ));
        }
        if let Some(value) = &new_value {
            value.validate(validator, Some(&self.value))?;
        }
        let metadata = self.item_metadata.new_draft_version(
            author,
            change_description.unwrap_or(NEW_DRAFT_DESCRIPTION),
        )?;
        self.item_metadata = metadata;
        if let Some(value) = new_value {
            self.value = value;
        }
        Ok(())
    }

    /// Replace the value of a draft. An equal value leaves the item untouched.
    pub fn edit_draft(
        &mut self,
        author: &Author,
        change_description: &str,
        new_value: V,
        validator: &dyn ReferenceValidator,
    ) -> MdrResult<()> {
        self.ensure_editable()?;
        if self.item_metadata.status() != LibraryItemStatus::Draft {
            return Err(MdrError::versioning_with_code(
                "The object is not in draft status.",
                "invalid_status_non_draft",
            ));
        }
        new_value.validate(validator, Some(&self.value))?;
        if new_value == self.value {
            return Ok(());
        }
        self.item_metadata = self
            .item_metadata
            .new_draft_version(author, change_description)?;
        self.value = new_value;
        Ok(())
    }

    /// Retire the current final version.
    pub fn inactivate(
        &mut self,
        author: &Author,
        change_description: Option<&str>,
    ) -> MdrResult<()> {
        self.ensure_editable()?;
        self.item_metadata = self.item_metadata.new_retired_version(
            author,
            change_description.unwrap_or(INACTIVATED_VERSION_DESCRIPTION),
        )?;
        Ok(())
    }

    /// Bring a retired version back to final.
    pub fn reactivate(
        &mut self,
        author: &Author,
        change_description: Option<&str>,
    ) -> MdrResult<()> {
        self.ensure_editable()?;
        if self.item_metadata.status() != LibraryItemStatus::Retired {
            return Err(MdrError::versioning_with_code(
                "Only RETIRED version can be reactivated.",
                "invalid_status_non_retired",
            ));
        }
        self.item_metadata = self.item_metadata.new_final_version(
            author,
            change_description.unwrap_or(REACTIVATED_VERSION_DESCRIPTION),
        )?;
        Ok(())
    }

    /// Mark a never-approved item as deleted.
    pub fn soft_delete(&mut self) -> MdrResult<()> {
        self.ensure_not_deleted()?;
        if self.item_metadata.major_version() != 0 {
            return Err(MdrError::versioning("Object has been accepted"));
        }
        self.is_deleted = true;
        Ok(())
    }

    /// Actions permitted on the current version, sorted.
    pub fn possible_actions(&self) -> Vec<ObjectAction> {
        if self.is_deleted {
            return Vec::new();
        }
        let mut actions = match self.item_metadata.status() {
            LibraryItemStatus::Draft if self.item_metadata.major_version() == 0 => vec![
                ObjectAction::Approve,
                ObjectAction::Delete,
                ObjectAction::Edit,
            ],
            LibraryItemStatus::Draft => vec![ObjectAction::Approve, ObjectAction::Edit],
            LibraryItemStatus::Final => vec![ObjectAction::Inactivate, ObjectAction::NewVersion],
            LibraryItemStatus::Retired => vec![ObjectAction::Reactivate],
        };
        actions.sort();
        actions
    }
}
