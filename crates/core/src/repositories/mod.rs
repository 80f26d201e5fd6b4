//! File-backed repositories.
//!
//! ## Storage Layout
//!
//! ```text
//! <mdr_data_dir>/
//!   libraries.yaml
//!   activities/
//!     <s1>/
//!       <s2>/
//!         <uid>/
//!           item.yaml   # latest snapshot
//!           .git/       # version chain, one commit per saved version
//!   activity_groups/ ct_terms/ odm_forms/ syntax_templates/
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the uid.
//!
//! These modules contain **only** data operations. Request orchestration lives in
//! [`crate::services`].

pub mod item;
pub mod library;
pub mod validator;

pub use item::{ItemFilter, ItemRepository, Page, VersionSelector};
pub use library::{LibraryRecord, LibraryRepository};
pub use validator::StoreValidator;

use crate::constants::ITEM_FILENAME;
use crate::versioning::LibraryItemMetadataVO;
use crate::{MdrError, MdrResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The on-disk snapshot of one version of a library item (`item.yaml`).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct StoredItem<V> {
    pub(crate) uid: String,
    pub(crate) library_name: String,
    #[serde(default)]
    pub(crate) deleted: bool,
    pub(crate) metadata: LibraryItemMetadataVO,
    pub(crate) value: V,
}

/// Parse YAML, naming the failing field on schema mismatches.
pub(crate) fn parse_yaml<T: DeserializeOwned>(yaml_text: &str, path: &Path) -> MdrResult<T> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
    serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let field = err.path().to_string();
        let field = if field.is_empty() || field == "." {
            "<root>".to_string()
        } else {
            field
        };
        MdrError::YamlDeserialization(format!(
            "{} schema mismatch at {field}: {}",
            path.display(),
            err.into_inner()
        ))
    })
}

/// Every item directory under `kind_dir` (`<s1>/<s2>/<uid>/`) that holds a snapshot.
///
/// Unreadable directories are skipped; a missing `kind_dir` yields nothing.
pub(crate) fn item_dirs(kind_dir: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let Ok(s1_iter) = fs::read_dir(kind_dir) else {
        return dirs;
    };
    for s1 in s1_iter.flatten() {
        let s1_path = s1.path();
        if !s1_path.is_dir() {
            continue;
        }
        let Ok(s2_iter) = fs::read_dir(&s1_path) else {
            continue;
        };
        for s2 in s2_iter.flatten() {
            let s2_path = s2.path();
            if !s2_path.is_dir() {
                continue;
            }
            let Ok(id_iter) = fs::read_dir(&s2_path) else {
                continue;
            };
            for id_ent in id_iter.flatten() {
                let id_path = id_ent.path();
                if id_path.join(ITEM_FILENAME).is_file() {
                    dirs.push(id_path);
                }
            }
        }
    }
    dirs.sort();
    dirs
}

/// Read the current snapshot of the item in `item_dir`.
pub(crate) fn read_snapshot<V: DeserializeOwned>(item_dir: &Path) -> MdrResult<StoredItem<V>> {
    let path = item_dir.join(ITEM_FILENAME);
    let contents = fs::read_to_string(&path).map_err(MdrError::FileRead)?;
    parse_yaml(&contents, &path)
}

/// Current snapshots of all live items under `kind_dir`, as untyped values.
///
/// Snapshots that cannot be parsed are logged and skipped.
pub(crate) fn live_snapshots(kind_dir: &Path) -> Vec<StoredItem<serde_json::Value>> {
    item_dirs(kind_dir)
        .into_iter()
        .filter_map(|dir| match read_snapshot::<serde_json::Value>(&dir) {
            Ok(item) if !item.deleted => Some(item),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("skipping unreadable item {}: {}", dir.display(), e);
                None
            }
        })
        .collect()
}

/// True if every `(field, value)` pair matches a top-level string field of `value`.
pub(crate) fn matches_criteria(value: &serde_json::Value, criteria: &[(&str, &str)]) -> bool {
    criteria
        .iter()
        .all(|(field, expected)| value.get(field).and_then(|v| v.as_str()) == Some(*expected))
}
