//! Library item persistence.
//!
//! One [`ItemRepository`] exists per entity kind. Each item is a sharded directory holding
//! `item.yaml` (the latest snapshot) and a Git repository whose commits form the version
//! chain. Saving an aggregate writes a new snapshot and commits it; nothing is ever removed,
//! soft deletion is itself a commit that flags the snapshot as deleted.

use crate::author::Author;
use crate::config::CoreConfig;
use crate::constants::{DEFAULT_GITIGNORE, DEFAULT_PAGE_SIZE, DELETED_DESCRIPTION, ITEM_FILENAME};
use crate::repositories::{
    item_dirs, live_snapshots, matches_criteria, parse_yaml, read_snapshot, LibraryRepository,
    StoredItem,
};
use crate::versioned_files::{FileToWrite, MdrCommitAction, MdrCommitMessage, VersionedFileService};
use crate::versioning::{
    LibraryItem, LibraryItemMetadataVO, LibraryItemStatus, LibraryItemValue, LibraryVO,
    RepositoryClosure,
};
use crate::{MdrError, MdrResult};
use chrono::{DateTime, Utc};
use mdr_types::VersionNumber;
use mdr_uuid::UuidService;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Chooses one version of an item. An empty selector picks the latest version.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VersionSelector {
    pub version: Option<VersionNumber>,
    pub status: Option<LibraryItemStatus>,
    /// The version that was current at this instant.
    pub at_specified_date_time: Option<DateTime<Utc>>,
}

impl VersionSelector {
    pub fn is_latest(&self) -> bool {
        self.version.is_none() && self.status.is_none() && self.at_specified_date_time.is_none()
    }

    fn matches(&self, metadata: &LibraryItemMetadataVO) -> bool {
        if self.version.is_some_and(|v| v != metadata.version_number()) {
            return false;
        }
        if self.status.is_some_and(|s| s != metadata.status()) {
            return false;
        }
        if let Some(at) = self.at_specified_date_time {
            if metadata.start_date() > at || metadata.end_date().is_some_and(|end| end <= at) {
                return false;
            }
        }
        true
    }
}

/// Listing options for [`ItemRepository::find_all`].
#[derive(Clone, Debug, PartialEq)]
pub struct ItemFilter {
    pub library_name: Option<String>,
    pub status: Option<LibraryItemStatus>,
    /// A value field, or one of `uid`, `library_name`, `status`, `version`, `start_date`.
    pub sort_by: Option<String>,
    pub sort_desc: bool,
    /// 1-based.
    pub page_number: usize,
    /// 0 returns every item.
    pub page_size: usize,
    pub total_count: bool,
}

impl Default for ItemFilter {
    fn default() -> Self {
        Self {
            library_name: None,
            status: None,
            sort_by: None,
            sort_desc: false,
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
            total_count: false,
        }
    }
}

/// One page of results.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of matches, when requested.
    pub total: Option<usize>,
    pub page_number: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    pub(crate) fn paginate(
        all: Vec<T>,
        page_number: usize,
        page_size: usize,
        total_count: bool,
    ) -> MdrResult<Self> {
        if page_number == 0 {
            return Err(MdrError::Validation("page_number must be at least 1".into()));
        }
        let total = total_count.then_some(all.len());
        let items = if page_size == 0 {
            all
        } else {
            all.into_iter()
                .skip((page_number - 1).saturating_mul(page_size))
                .take(page_size)
                .collect()
        };
        Ok(Self {
            items,
            total,
            page_number,
            page_size,
        })
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page_number: self.page_number,
            page_size: self.page_size,
        }
    }
}

/// Persistence for library items of one kind `V`.
#[derive(Clone, Debug)]
pub struct ItemRepository<V> {
    cfg: Arc<CoreConfig>,
    libraries: LibraryRepository,
    _value: PhantomData<fn() -> V>,
}

impl<V: LibraryItemValue> ItemRepository<V> {
    pub fn new(cfg: Arc<CoreConfig>, libraries: LibraryRepository) -> Self {
        Self {
            cfg,
            libraries,
            _value: PhantomData,
        }
    }

    fn kind_dir(&self) -> PathBuf {
        self.cfg.kind_dir(V::KIND)
    }

    /// A fresh uid for a new item.
    pub fn generate_uid(&self) -> String {
        UuidService::new().to_string()
    }

    /// Directory of `uid`, or `None` if `uid` is not a canonical uid.
    fn item_dir(&self, uid: &str) -> Option<PathBuf> {
        UuidService::parse(uid)
            .ok()
            .map(|u| u.sharded_dir(&self.kind_dir()))
    }

    fn existing_item_dir(&self, uid: &str) -> Option<PathBuf> {
        self.item_dir(uid)
            .filter(|dir| dir.join(ITEM_FILENAME).is_file())
    }

    fn library_lookup(&self) -> MdrResult<HashMap<String, bool>> {
        Ok(self
            .libraries
            .list()?
            .into_iter()
            .map(|l| (l.name, l.is_editable))
            .collect())
    }

    fn to_item(
        stored: StoredItem<V>,
        closure: Option<RepositoryClosure<V>>,
        libraries: &HashMap<String, bool>,
    ) -> LibraryItem<V> {
        let is_editable = match libraries.get(&stored.library_name) {
            Some(editable) => *editable,
            None => {
                tracing::warn!(
                    library = %stored.library_name,
                    uid = %stored.uid,
                    "item references an unknown library; treating it as not editable"
                );
                false
            }
        };
        LibraryItem::from_repository_values(
            stored.uid,
            stored.value,
            LibraryVO::from_repository_values(stored.library_name, is_editable),
            stored.metadata,
            closure,
        )
    }

    /// Latest version of `uid`, or `None` if it does not exist or was deleted.
    ///
    /// Only aggregates loaded with `for_update` can be saved again.
    pub fn find_by_uid(&self, uid: &str, for_update: bool) -> MdrResult<Option<LibraryItem<V>>> {
        let Some(dir) = self.existing_item_dir(uid) else {
            return Ok(None);
        };
        let stored: StoredItem<V> = read_snapshot(&dir)?;
        if stored.deleted {
            return Ok(None);
        }

        let closure = if for_update {
            let head = VersionedFileService::open(&dir)?.head_id()?.ok_or_else(|| {
                MdrError::CorruptMetadata(format!("item {uid} has no committed versions"))
            })?;
            Some(RepositoryClosure {
                head,
                metadata: stored.metadata.clone(),
                value: stored.value.clone(),
            })
        } else {
            None
        };

        Ok(Some(Self::to_item(stored, closure, &self.library_lookup()?)))
    }

    /// Saved versions in `dir`, oldest first, each closed at its successor's start.
    fn versions_in(dir: &Path) -> MdrResult<Vec<StoredItem<V>>> {
        let service = VersionedFileService::open(dir)?;
        let snapshot_path = dir.join(ITEM_FILENAME);
        let mut versions = Vec::new();
        for revision in service.file_history(Path::new(ITEM_FILENAME))? {
            let stored: StoredItem<V> = parse_yaml(&revision.content, &snapshot_path)?;
            if !stored.deleted {
                versions.push(stored);
            }
        }

        let successor_starts: Vec<DateTime<Utc>> = versions
            .iter()
            .skip(1)
            .map(|v| v.metadata.start_date())
            .collect();
        for (version, end) in versions.iter_mut().zip(successor_starts) {
            version.metadata = version.metadata.closed_at(end);
        }
        Ok(versions)
    }

    /// Every version of `uid`, oldest first. Empty if the item does not exist or was deleted.
    pub fn get_all_versions(&self, uid: &str) -> MdrResult<Vec<LibraryItem<V>>> {
        let Some(dir) = self.existing_item_dir(uid) else {
            return Ok(Vec::new());
        };
        let current: StoredItem<serde_json::Value> = read_snapshot(&dir)?;
        if current.deleted {
            return Ok(Vec::new());
        }
        let libraries = self.library_lookup()?;
        Ok(Self::versions_in(&dir)?
            .into_iter()
            .map(|stored| Self::to_item(stored, None, &libraries))
            .collect())
    }

    /// The most recent version of `uid` matching `selector`. Read-only.
    pub fn find_version(
        &self,
        uid: &str,
        selector: &VersionSelector,
    ) -> MdrResult<Option<LibraryItem<V>>> {
        if selector.is_latest() {
            return self.find_by_uid(uid, false);
        }
        Ok(self
            .get_all_versions(uid)?
            .into_iter()
            .rev()
            .find(|item| selector.matches(item.item_metadata())))
    }

    fn commit_message(
        item: &LibraryItem<V>,
        action: MdrCommitAction,
        summary: &str,
    ) -> MdrResult<MdrCommitMessage> {
        let metadata = item.item_metadata();
        MdrCommitMessage::new(V::KIND, action, summary)?
            .with_trailer("Library", item.library().name())?
            .with_trailer("Status", metadata.status().as_str())?
            .with_trailer("Version", metadata.version())
    }

    fn render_snapshot(item: &LibraryItem<V>, uid: &str) -> MdrResult<String> {
        let stored = StoredItem {
            uid: uid.to_string(),
            library_name: item.library().name().to_string(),
            deleted: item.is_deleted(),
            metadata: item.item_metadata().clone(),
            value: item.value().clone(),
        };
        serde_yaml::to_string(&stored).map_err(MdrError::YamlSerialization)
    }

    fn saved_closure(item: &LibraryItem<V>, head: git2::Oid) -> RepositoryClosure<V> {
        RepositoryClosure {
            head: head.to_string(),
            metadata: item.item_metadata().clone(),
            value: item.value().clone(),
        }
    }

    /// Persist `item`.
    ///
    /// - New items get a repository and an initial commit.
    /// - Items loaded for update get a new commit if their metadata, value or deletion flag
    ///   changed; otherwise nothing is written.
    ///
    /// # Errors
    ///
    /// - [`MdrError::BusinessLogic`] for aggregates loaded read-only.
    /// - [`MdrError::Versioning`] with code `concurrent_modification` if the version chain moved
    ///   since the aggregate was loaded.
    pub fn save(&self, item: &mut LibraryItem<V>, author: &Author) -> MdrResult<()> {
        let uid = item.require_uid()?.to_string();
        let dir = self
            .item_dir(&uid)
            .ok_or_else(|| MdrError::Validation(format!("invalid uid: {uid}")))?;

        if !item.is_persisted() {
            return self.create(item, author, &uid, &dir);
        }

        let Some(closure) = item.closure().cloned() else {
            return Err(MdrError::BusinessLogic(
                "Library item was retrieved read-only and cannot be saved.".into(),
            ));
        };

        let head = VersionedFileService::open(&dir)?.head_id()?;
        if head.as_deref() != Some(closure.head()) {
            return Err(MdrError::versioning_with_code(
                format!("{} with uid {uid} was modified by another request. Reload and retry.", V::KIND),
                "concurrent_modification",
            ));
        }

        let action = if item.is_deleted() {
            MdrCommitAction::Delete
        } else if item.item_metadata() == &closure.metadata && item.value() == &closure.value {
            return Ok(());
        } else {
            commit_action(closure.metadata.status(), item.item_metadata().status())
        };
        let summary = match action {
            MdrCommitAction::Delete => DELETED_DESCRIPTION,
            _ => item.item_metadata().change_description(),
        };
        let message = Self::commit_message(item, action, summary)?;

        let snapshot = Self::render_snapshot(item, &uid)?;
        let old_snapshot =
            std::fs::read_to_string(dir.join(ITEM_FILENAME)).map_err(MdrError::FileRead)?;
        let oid = VersionedFileService::write_and_commit_files(
            &dir,
            author,
            &message,
            &[FileToWrite {
                relative_path: Path::new(ITEM_FILENAME),
                content: &snapshot,
                old_content: Some(&old_snapshot),
            }],
        )?;

        item.mark_saved(Self::saved_closure(item, oid));
        tracing::info!(
            kind = V::KIND.commit_domain(),
            uid = %uid,
            action = %action,
            version = %item.item_metadata().version(),
            "library item saved"
        );
        Ok(())
    }

    fn create(
        &self,
        item: &mut LibraryItem<V>,
        author: &Author,
        uid: &str,
        dir: &Path,
    ) -> MdrResult<()> {
        if item.is_deleted() {
            return Ok(());
        }
        if dir.exists() {
            return Err(MdrError::AlreadyExists(format!(
                "{} with uid {uid} already exists.",
                V::KIND
            )));
        }

        let message = Self::commit_message(
            item,
            MdrCommitAction::Create,
            item.item_metadata().change_description(),
        )?;
        let snapshot = Self::render_snapshot(item, uid)?;
        let files = [
            FileToWrite {
                relative_path: Path::new(".gitignore"),
                content: DEFAULT_GITIGNORE,
                old_content: None,
            },
            FileToWrite {
                relative_path: Path::new(ITEM_FILENAME),
                content: &snapshot,
                old_content: None,
            },
        ];
        let oid = VersionedFileService::init_and_commit(dir, author, &message, &files)?;

        item.mark_saved(Self::saved_closure(item, oid));
        tracing::info!(
            kind = V::KIND.commit_domain(),
            uid = %uid,
            library = item.library().name(),
            "library item created"
        );
        Ok(())
    }

    /// True if a live item other than `exclude_uid` has `field == value`.
    pub fn exists_by(&self, field: &str, value: &str, exclude_uid: Option<&str>) -> MdrResult<bool> {
        self.exists_matching(&[(field, value)], exclude_uid)
    }

    pub fn exists_matching(
        &self,
        criteria: &[(&str, &str)],
        exclude_uid: Option<&str>,
    ) -> MdrResult<bool> {
        Ok(live_snapshots(&self.kind_dir()).iter().any(|stored| {
            Some(stored.uid.as_str()) != exclude_uid && matches_criteria(&stored.value, criteria)
        }))
    }

    fn live_typed_snapshots(&self) -> Vec<(PathBuf, StoredItem<V>)> {
        item_dirs(&self.kind_dir())
            .into_iter()
            .filter_map(|dir| match read_snapshot::<V>(&dir) {
                Ok(stored) if !stored.deleted => Some((dir, stored)),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("skipping unreadable item {}: {}", dir.display(), e);
                    None
                }
            })
            .collect()
    }

    /// Latest versions of live items matching `filter`, sorted and paginated.
    pub fn find_all(&self, filter: &ItemFilter) -> MdrResult<Page<LibraryItem<V>>> {
        let mut matching: Vec<StoredItem<V>> = self
            .live_typed_snapshots()
            .into_iter()
            .map(|(_, stored)| stored)
            .filter(|s| {
                filter
                    .library_name
                    .as_deref()
                    .map_or(true, |lib| s.library_name == lib)
            })
            .filter(|s| filter.status.map_or(true, |st| s.metadata.status() == st))
            .collect();

        let sort_by = filter.sort_by.as_deref().unwrap_or("name");
        let mut keyed: Vec<(serde_json::Value, StoredItem<V>)> = matching
            .drain(..)
            .map(|s| Ok((sort_key(&s, sort_by)?, s)))
            .collect::<MdrResult<_>>()?;
        keyed.sort_by(|(ka, a), (kb, b)| {
            let ord = compare_json(ka, kb).then_with(|| a.uid.cmp(&b.uid));
            if filter.sort_desc {
                ord.reverse()
            } else {
                ord
            }
        });

        let libraries = self.library_lookup()?;
        let sorted = keyed
            .into_iter()
            .map(|(_, s)| Self::to_item(s, None, &libraries))
            .collect();
        Page::paginate(sorted, filter.page_number, filter.page_size, filter.total_count)
    }

    /// Every version of every live item of this kind, newest first.
    pub fn retrieve_audit_trail(
        &self,
        page_number: usize,
        page_size: usize,
        total_count: bool,
    ) -> MdrResult<Page<LibraryItem<V>>> {
        let mut versions = Vec::new();
        for (dir, _) in self.live_typed_snapshots() {
            versions.extend(Self::versions_in(&dir)?);
        }
        versions.sort_by(|a, b| {
            b.metadata
                .start_date()
                .cmp(&a.metadata.start_date())
                .then_with(|| a.uid.cmp(&b.uid))
        });

        let libraries = self.library_lookup()?;
        let items = versions
            .into_iter()
            .map(|s| Self::to_item(s, None, &libraries))
            .collect();
        Page::paginate(items, page_number, page_size, total_count)
    }
}

/// Commit action recorded for a metadata transition.
fn commit_action(from: LibraryItemStatus, to: LibraryItemStatus) -> MdrCommitAction {
    use LibraryItemStatus::*;
    match (from, to) {
        (Draft, Final) => MdrCommitAction::Approve,
        (Final, Draft) => MdrCommitAction::NewVersion,
        (Final, Retired) => MdrCommitAction::Inactivate,
        (Retired, Final) => MdrCommitAction::Reactivate,
        _ => MdrCommitAction::Edit,
    }
}

fn sort_key<V: LibraryItemValue>(stored: &StoredItem<V>, field: &str) -> MdrResult<serde_json::Value> {
    use serde_json::{json, Value};
    let metadata = &stored.metadata;
    Ok(match field {
        "uid" => json!(stored.uid),
        "library_name" => json!(stored.library_name),
        "status" => json!(metadata.status().as_str()),
        "version" => json!([metadata.major_version(), metadata.minor_version()]),
        "start_date" => json!(metadata.start_date().timestamp_micros()),
        "author" => json!(metadata.author()),
        "name" => json!(stored.value.name()),
        _ => serde_json::to_value(&stored.value)
            .map_err(MdrError::Serialization)?
            .get(field)
            .cloned()
            .unwrap_or(Value::Null),
    })
}

/// Total order over sort keys: null < bool < number < string < array, strings case-insensitive.
fn compare_json(a: &serde_json::Value, b: &serde_json::Value) -> Ordering {
    use serde_json::Value;
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(l, r)| compare_json(l, r))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ActivityGroupVO, ActivityVO, CtTermAttributesVO};
    use crate::versioning::testing::FakeValidator;
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        repo: ItemRepository<ActivityVO>,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let cfg = Arc::new(
            CoreConfig::new(temp.path().to_path_buf(), Author::new("t", None).unwrap()).unwrap(),
        );
        let libraries = LibraryRepository::new(cfg.clone());
        libraries.ensure_defaults().unwrap();
        Fixture {
            _temp: temp,
            repo: ItemRepository::new(cfg, libraries),
        }
    }

    fn author() -> Author {
        Author::new("x", None).unwrap()
    }

    fn create(repo: &ItemRepository<ActivityVO>, name: &str) -> String {
        let mut item = LibraryItem::from_input_values(
            &author(),
            ActivityVO::new(name),
            LibraryVO::from_repository_values("Sponsor", true),
            || repo.generate_uid(),
            &FakeValidator::default(),
        )
        .unwrap();
        repo.save(&mut item, &author()).unwrap();
        item.uid().unwrap().to_string()
    }

    #[test]
    fn saved_item_can_be_found() {
        let f = fixture();
        let uid = create(&f.repo, "Weight");
        let item = f.repo.find_by_uid(&uid, false).unwrap().unwrap();
        assert_eq!(item.name(), "Weight");
        assert_eq!(item.item_metadata().version(), "0.1");
        assert!(item.library().is_editable());
        assert!(item.closure().is_none());
    }

    #[test]
    fn unknown_or_malformed_uid_is_none() {
        let f = fixture();
        assert!(f.repo.find_by_uid("not-a-uid", false).unwrap().is_none());
        let missing = f.repo.generate_uid();
        assert!(f.repo.find_by_uid(&missing, true).unwrap().is_none());
    }

    #[test]
    fn read_only_items_cannot_be_saved() {
        let f = fixture();
        let uid = create(&f.repo, "Weight");
        let mut item = f.repo.find_by_uid(&uid, false).unwrap().unwrap();
        item.approve(&author(), None).unwrap();
        let err = f.repo.save(&mut item, &author()).unwrap_err();
        assert!(matches!(err, MdrError::BusinessLogic(_)));
    }

    #[test]
    fn history_closes_end_dates() {
        let f = fixture();
        let uid = create(&f.repo, "Weight");
        let mut item = f.repo.find_by_uid(&uid, true).unwrap().unwrap();
        item.approve(&author(), None).unwrap();
        f.repo.save(&mut item, &author()).unwrap();
        item.create_new_version(&author(), None, None, &FakeValidator::default())
            .unwrap();
        f.repo.save(&mut item, &author()).unwrap();

        let versions = f.repo.get_all_versions(&uid).unwrap();
        let labels: Vec<String> = versions
            .iter()
            .map(|v| v.item_metadata().version())
            .collect();
        assert_eq!(labels, vec!["0.1", "1.0", "1.1"]);
        assert_eq!(
            versions[0].item_metadata().end_date(),
            Some(versions[1].item_metadata().start_date())
        );
        assert!(versions[2].item_metadata().end_date().is_none());
    }

    #[test]
    fn unchanged_item_writes_no_commit() {
        let f = fixture();
        let uid = create(&f.repo, "Weight");
        let mut item = f.repo.find_by_uid(&uid, true).unwrap().unwrap();
        let head = item.closure().unwrap().head().to_string();
        f.repo.save(&mut item, &author()).unwrap();
        assert_eq!(item.closure().unwrap().head(), head);
        assert_eq!(f.repo.get_all_versions(&uid).unwrap().len(), 1);
    }

    #[test]
    fn concurrent_modification_is_detected() {
        let f = fixture();
        let uid = create(&f.repo, "Weight");
        let mut first = f.repo.find_by_uid(&uid, true).unwrap().unwrap();
        let mut second = f.repo.find_by_uid(&uid, true).unwrap().unwrap();

        first.approve(&author(), None).unwrap();
        f.repo.save(&mut first, &author()).unwrap();

        second
            .edit_draft(&author(), "rename", ActivityVO::new("Mass"), &FakeValidator::default())
            .unwrap();
        let err = f.repo.save(&mut second, &author()).unwrap_err();
        assert_eq!(err.code(), Some("concurrent_modification"));
    }

    #[test]
    fn soft_deleted_items_disappear() {
        let f = fixture();
        let uid = create(&f.repo, "Weight");
        let mut item = f.repo.find_by_uid(&uid, true).unwrap().unwrap();
        item.soft_delete().unwrap();
        f.repo.save(&mut item, &author()).unwrap();

        assert!(f.repo.find_by_uid(&uid, false).unwrap().is_none());
        assert!(f.repo.get_all_versions(&uid).unwrap().is_empty());
        assert!(!f.repo.exists_by("name", "Weight", None).unwrap());
    }

    #[test]
    fn find_version_by_number_status_and_date() {
        let f = fixture();
        let uid = create(&f.repo, "Weight");
        let mut item = f.repo.find_by_uid(&uid, true).unwrap().unwrap();
        item.approve(&author(), None).unwrap();
        f.repo.save(&mut item, &author()).unwrap();
        item.create_new_version(&author(), None, None, &FakeValidator::default())
            .unwrap();
        f.repo.save(&mut item, &author()).unwrap();

        let by_version = VersionSelector {
            version: Some(VersionNumber::new(0, 1)),
            ..Default::default()
        };
        let found = f.repo.find_version(&uid, &by_version).unwrap().unwrap();
        assert_eq!(found.item_metadata().version(), "0.1");

        let by_status = VersionSelector {
            status: Some(LibraryItemStatus::Final),
            ..Default::default()
        };
        let found = f.repo.find_version(&uid, &by_status).unwrap().unwrap();
        assert_eq!(found.item_metadata().version(), "1.0");

        let versions = f.repo.get_all_versions(&uid).unwrap();
        let by_date = VersionSelector {
            at_specified_date_time: Some(versions[1].item_metadata().start_date()),
            ..Default::default()
        };
        let found = f.repo.find_version(&uid, &by_date).unwrap().unwrap();
        assert_eq!(found.item_metadata().version(), "1.0");

        let missing = VersionSelector {
            status: Some(LibraryItemStatus::Retired),
            ..Default::default()
        };
        assert!(f.repo.find_version(&uid, &missing).unwrap().is_none());
    }

    #[test]
    fn exists_by_can_exclude_an_item() {
        let f = fixture();
        let uid = create(&f.repo, "Weight");
        assert!(f.repo.exists_by("name", "Weight", None).unwrap());
        assert!(!f.repo.exists_by("name", "Weight", Some(&uid)).unwrap());
    }

    #[test]
    fn find_all_filters_sorts_and_pages() {
        let f = fixture();
        for name in ["charlie", "Alpha", "bravo"] {
            create(&f.repo, name);
        }
        let page = f
            .repo
            .find_all(&ItemFilter {
                page_size: 2,
                total_count: true,
                ..Default::default()
            })
            .unwrap();
        let names: Vec<&str> = page.items.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["Alpha", "bravo"]);
        assert_eq!(page.total, Some(3));

        let desc = f
            .repo
            .find_all(&ItemFilter {
                sort_desc: true,
                page_size: 0,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(desc.items[0].name(), "charlie");

        let finals = f
            .repo
            .find_all(&ItemFilter {
                status: Some(LibraryItemStatus::Final),
                ..Default::default()
            })
            .unwrap();
        assert!(finals.items.is_empty());

        assert!(f
            .repo
            .find_all(&ItemFilter {
                page_number: 0,
                ..Default::default()
            })
            .is_err());
    }

    #[test]
    fn audit_trail_is_newest_first() {
        let f = fixture();
        let uid = create(&f.repo, "Weight");
        create(&f.repo, "Height");
        let mut item = f.repo.find_by_uid(&uid, true).unwrap().unwrap();
        item.approve(&author(), None).unwrap();
        f.repo.save(&mut item, &author()).unwrap();

        let trail = f.repo.retrieve_audit_trail(1, 0, true).unwrap();
        assert_eq!(trail.total, Some(3));
        assert_eq!(trail.items[0].item_metadata().version(), "1.0");
        let starts: Vec<_> = trail
            .items
            .iter()
            .map(|i| i.item_metadata().start_date())
            .collect();
        assert!(starts.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn items_of_other_kinds_are_separate() {
        let f = fixture();
        create(&f.repo, "Weight");
        let groups: ItemRepository<ActivityGroupVO> =
            ItemRepository::new(f.repo.cfg.clone(), f.repo.libraries.clone());
        assert!(groups.find_all(&ItemFilter::default()).unwrap().items.is_empty());
    }

    #[test]
    fn default_sort_uses_item_name_for_ct_terms() {
        let f = fixture();
        let terms: ItemRepository<CtTermAttributesVO> =
            ItemRepository::new(f.repo.cfg.clone(), f.repo.libraries.clone());
        for (submission, term) in [("C3", "Weight"), ("C1", "height"), ("C2", "Pulse")] {
            let mut item = LibraryItem::from_input_values(
                &author(),
                CtTermAttributesVO::new("CL1", "Unit", "SDTM CT", submission, term),
                LibraryVO::from_repository_values("Sponsor", true),
                || terms.generate_uid(),
                &FakeValidator::default(),
            )
            .unwrap();
            terms.save(&mut item, &author()).unwrap();
        }

        let page = terms.find_all(&ItemFilter::default()).unwrap();
        let names: Vec<&str> = page.items.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["height", "Pulse", "Weight"]);
    }

    #[test]
    fn compare_json_orders_mixed_keys() {
        assert_eq!(compare_json(&json!(null), &json!("a")), Ordering::Less);
        assert_eq!(compare_json(&json!("B"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_json(&json!([1, 10]), &json!([1, 9])), Ordering::Greater);
        assert_eq!(compare_json(&json!(2), &json!(10)), Ordering::Less);
    }
}
