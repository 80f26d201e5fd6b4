//! Field-level changes between consecutive versions of an item.

use crate::versioning::{LibraryItem, LibraryItemValue};
use crate::{MdrError, MdrResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Fields that change with every saved version and are never reported.
const BOOKKEEPING_FIELDS: &[&str] = &["start_date", "end_date", "author", "change_description"];

/// The fields compared between versions: the value's fields plus library, status and version.
pub fn comparable_fields<V: LibraryItemValue>(item: &LibraryItem<V>) -> MdrResult<Map<String, Value>> {
    let mut fields = match serde_json::to_value(item.value()).map_err(MdrError::Serialization)? {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".into(), other);
            map
        }
    };
    let metadata = item.item_metadata();
    fields.insert("library_name".into(), Value::from(item.library().name()));
    fields.insert("status".into(), Value::from(metadata.status().as_str()));
    fields.insert("version".into(), Value::from(metadata.version()));
    Ok(fields)
}

/// Names of fields that differ between `previous` and `current`, each mapped to `true`.
///
/// A field present on only one side counts as changed.
pub fn changed_fields(previous: &Map<String, Value>, current: &Map<String, Value>) -> BTreeMap<String, bool> {
    previous
        .keys()
        .chain(current.keys())
        .filter(|key| !BOOKKEEPING_FIELDS.contains(&key.as_str()))
        .filter(|key| previous.get(*key) != current.get(*key))
        .map(|key| (key.clone(), true))
        .collect()
}

/// Changes of each version against its predecessor; `versions` is oldest first.
///
/// The first version has no predecessor and gets an empty map.
pub fn version_changes<V: LibraryItemValue>(
    versions: &[LibraryItem<V>],
) -> MdrResult<Vec<BTreeMap<String, bool>>> {
    let fields = versions
        .iter()
        .map(comparable_fields)
        .collect::<MdrResult<Vec<_>>>()?;

    let mut changes = Vec::with_capacity(fields.len());
    for (i, current) in fields.iter().enumerate() {
        changes.push(match i.checked_sub(1) {
            Some(prev) => changed_fields(&fields[prev], current),
            None => BTreeMap::new(),
        });
    }
    Ok(changes)
}
