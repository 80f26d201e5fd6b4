//! Library item services: one unit of work per call.
//!
//! A service owns the repository of its kind, the library repository and a reference
//! validator over all stored kinds. Client input arrives as JSON maps and is parsed into the
//! value type here, so a failing field is reported by its path.

use crate::author::Author;
use crate::config::CoreConfig;
use crate::diff;
use crate::repositories::{
    ItemFilter, ItemRepository, LibraryRepository, Page, StoreValidator, VersionSelector,
};
use crate::versioning::{LibraryItem, LibraryItemValue, LibraryVO};
use crate::{MdrError, MdrResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// One entry of a version history: a version and the fields it changed.
#[derive(Clone, Debug)]
pub struct VersionHistoryEntry<V: LibraryItemValue> {
    pub item: LibraryItem<V>,
    pub changes: BTreeMap<String, bool>,
}

/// Request-level operations on library items of kind `V`.
///
/// Every write loads, validates and saves while holding the write lock of its kind.
/// Reference checks against other kinds read without their locks.
#[derive(Clone, Debug)]
pub struct LibraryItemService<V> {
    repo: ItemRepository<V>,
    libraries: LibraryRepository,
    validator: StoreValidator,
    write_lock: Arc<Mutex<()>>,
}

impl<V: LibraryItemValue> LibraryItemService<V> {
    pub fn new(cfg: Arc<CoreConfig>, libraries: LibraryRepository) -> Self {
        Self {
            repo: ItemRepository::new(cfg.clone(), libraries.clone()),
            libraries,
            validator: StoreValidator::new(cfg),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn version_not_found(uid: &str) -> MdrError {
        MdrError::NotFound(format!(
            "{} with uid {uid} does not exist or there's no version with requested status or version number.",
            V::KIND
        ))
    }

    fn load_for_update(&self, uid: &str) -> MdrResult<LibraryItem<V>> {
        self.repo
            .find_by_uid(uid, true)?
            .ok_or_else(|| MdrError::NotFound(format!("{} with uid {uid} does not exist.", V::KIND)))
    }

    /// Build a value from client input, naming the offending field on failure.
    fn parse_value(mut input: Map<String, Value>) -> MdrResult<V> {
        V::prepare_input(&mut input);
        serde_path_to_error::deserialize(Value::Object(input)).map_err(|err| {
            let field = err.path().to_string();
            MdrError::Validation(format!("{field}: {}", err.into_inner()))
        })
    }

    /// Overlay `patch` onto the fields of `current`.
    fn merge_patch(current: &V, patch: Map<String, Value>) -> MdrResult<V> {
        let mut fields = match serde_json::to_value(current).map_err(MdrError::Serialization)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        fields.extend(patch);
        Self::parse_value(fields)
    }

    /// Create a new item in `library_name`.
    ///
    /// # Errors
    ///
    /// - [`MdrError::BusinessLogic`] if the library does not exist or is not editable.
    /// - [`MdrError::Validation`] if `input` does not describe a valid value.
    pub fn create(
        &self,
        library_name: &str,
        input: Map<String, Value>,
        author: &Author,
    ) -> MdrResult<LibraryItem<V>> {
        if !self.libraries.library_exists(library_name)? {
            return Err(MdrError::BusinessLogic(format!(
                "There is no library identified by provided library name ({library_name})"
            )));
        }
        let library =
            LibraryVO::from_input_values(library_name, |name| self.libraries.is_editable(name))?;
        let value = Self::parse_value(input)?;

        let _guard = self.lock();
        let mut item = LibraryItem::from_input_values(
            author,
            value,
            library,
            || self.repo.generate_uid(),
            &self.validator,
        )?;
        self.repo.save(&mut item, author)?;
        Ok(item)
    }

    pub fn get_by_uid(&self, uid: &str, selector: &VersionSelector) -> MdrResult<LibraryItem<V>> {
        self.repo
            .find_version(uid, selector)?
            .ok_or_else(|| Self::version_not_found(uid))
    }

    pub fn get_all(&self, filter: &ItemFilter) -> MdrResult<Page<LibraryItem<V>>> {
        self.repo.find_all(filter)
    }

    /// All versions of `uid`, oldest first, with the fields each one changed.
    pub fn get_version_history(&self, uid: &str) -> MdrResult<Vec<VersionHistoryEntry<V>>> {
        let versions = self.repo.get_all_versions(uid)?;
        if versions.is_empty() {
            return Err(Self::version_not_found(uid));
        }
        let changes = diff::version_changes(&versions)?;
        Ok(versions
            .into_iter()
            .zip(changes)
            .map(|(item, changes)| VersionHistoryEntry { item, changes })
            .collect())
    }

    pub fn get_audit_trail(
        &self,
        page_number: usize,
        page_size: usize,
        total_count: bool,
    ) -> MdrResult<Page<LibraryItem<V>>> {
        self.repo
            .retrieve_audit_trail(page_number, page_size, total_count)
    }

    /// Apply a partial value to the current draft.
    pub fn edit_draft(
        &self,
        uid: &str,
        patch: Map<String, Value>,
        change_description: &str,
        author: &Author,
    ) -> MdrResult<LibraryItem<V>> {
        let _guard = self.lock();
        let mut item = self.load_for_update(uid)?;
        let new_value = Self::merge_patch(item.value(), patch)?;
        item.edit_draft(author, change_description, new_value, &self.validator)?;
        self.repo.save(&mut item, author)?;
        Ok(item)
    }

    pub fn approve(&self, uid: &str, author: &Author) -> MdrResult<LibraryItem<V>> {
        let _guard = self.lock();
        let mut item = self.load_for_update(uid)?;
        item.approve(author, None)?;
        self.repo.save(&mut item, author)?;
        Ok(item)
    }

    /// Start a new draft, optionally replacing fields of the value at the same time.
    pub fn create_new_version(
        &self,
        uid: &str,
        change_description: Option<&str>,
        patch: Option<Map<String, Value>>,
        author: &Author,
    ) -> MdrResult<LibraryItem<V>> {
        let _guard = self.lock();
        let mut item = self.load_for_update(uid)?;
        let new_value = match patch {
            Some(patch) if !patch.is_empty() => Some(Self::merge_patch(item.value(), patch)?),
            _ => None,
        };
        item.create_new_version(author, change_description, new_value, &self.validator)?;
        self.repo.save(&mut item, author)?;
        Ok(item)
    }

    pub fn inactivate_final(&self, uid: &str, author: &Author) -> MdrResult<LibraryItem<V>> {
        let _guard = self.lock();
        let mut item = self.load_for_update(uid)?;
        item.inactivate(author, None)?;
        self.repo.save(&mut item, author)?;
        Ok(item)
    }

    pub fn reactivate_retired(&self, uid: &str, author: &Author) -> MdrResult<LibraryItem<V>> {
        let _guard = self.lock();
        let mut item = self.load_for_update(uid)?;
        item.reactivate(author, None)?;
        self.repo.save(&mut item, author)?;
        Ok(item)
    }

    pub fn soft_delete(&self, uid: &str, author: &Author) -> MdrResult<()> {
        let _guard = self.lock();
        let mut item = self.load_for_update(uid)?;
        item.soft_delete()?;
        self.repo.save(&mut item, author)
    }
}
