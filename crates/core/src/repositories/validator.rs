//! Reference checks against the stored library items of every kind.
//!
//! Reads here take no locks. A referenced item deleted by a concurrent request of another
//! kind can still pass validation.

use crate::config::CoreConfig;
use crate::repositories::{live_snapshots, matches_criteria, read_snapshot};
use crate::constants::ITEM_FILENAME;
use crate::versioning::{ItemKind, ReferenceValidator};
use crate::MdrResult;
use mdr_uuid::UuidService;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct StoreValidator {
    cfg: Arc<CoreConfig>,
}

impl StoreValidator {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }
}

impl ReferenceValidator for StoreValidator {
    fn exists_by(&self, kind: ItemKind, criteria: &[(&str, &str)]) -> MdrResult<bool> {
        Ok(live_snapshots(&self.cfg.kind_dir(kind))
            .iter()
            .any(|stored| matches_criteria(&stored.value, criteria)))
    }

    fn item_exists(&self, kind: ItemKind, uid: &str) -> MdrResult<bool> {
        let Ok(parsed) = UuidService::parse(uid) else {
            return Ok(false);
        };
        let dir = parsed.sharded_dir(&self.cfg.kind_dir(kind));
        if !dir.join(ITEM_FILENAME).is_file() {
            return Ok(false);
        }
        let stored = read_snapshot::<serde_json::Value>(&dir)?;
        Ok(!stored.deleted)
    }
}
