//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. Core
//! code never reads process-wide environment variables during request handling.

use crate::author::Author;
use crate::versioning::ItemKind;
use crate::{MdrError, MdrResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    default_author: Author,
}

impl CoreConfig {
    /// Create a new `CoreConfig`, creating `data_dir` if it does not exist yet.
    pub fn new(data_dir: PathBuf, default_author: Author) -> MdrResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(MdrError::Validation("data directory cannot be empty".into()));
        }
        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir).map_err(MdrError::StorageDirCreation)?;
            tracing::info!("created MDR data directory {}", data_dir.display());
        } else if !data_dir.is_dir() {
            return Err(MdrError::Validation(format!(
                "data directory is not a directory: {}",
                data_dir.display()
            )));
        }

        Ok(Self {
            data_dir,
            default_author,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory holding every item of `kind`.
    pub fn kind_dir(&self, kind: ItemKind) -> PathBuf {
        self.data_dir.join(kind.dir_name())
    }

    pub fn default_author(&self) -> &Author {
        &self.default_author
    }
}

/// Resolve the data directory from an optional configured value.
///
/// Empty or whitespace-only values fall back to [`crate::constants::DEFAULT_MDR_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(crate::constants::DEFAULT_MDR_DATA_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn new_creates_missing_data_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("mdr");
        let cfg = CoreConfig::new(dir.clone(), Author::new("tester", None).unwrap()).unwrap();
        assert!(dir.is_dir());
        assert_eq!(cfg.kind_dir(ItemKind::Activity), dir.join("activities"));
    }

    #[test]
    fn new_rejects_file_as_data_dir() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();
        let err = CoreConfig::new(file, Author::new("tester", None).unwrap()).unwrap_err();
        assert!(matches!(err, MdrError::Validation(_)));
    }

    #[test]
    fn data_dir_falls_back_to_default() {
        assert_eq!(data_dir_from_env_value(None), PathBuf::from("mdr_data"));
        assert_eq!(
            data_dir_from_env_value(Some("  ".into())),
            PathBuf::from("mdr_data")
        );
        assert_eq!(
            data_dir_from_env_value(Some("/srv/mdr".into())),
            PathBuf::from("/srv/mdr")
        );
    }
}
