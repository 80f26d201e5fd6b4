//! Content libraries.
//!
//! Libraries are few and rarely change, so they live in a single registry file:
//!
//! ```text
//! <mdr_data_dir>/libraries.yaml
//! ```

use crate::config::CoreConfig;
use crate::constants::{CDISC_LIBRARY, LIBRARIES_FILENAME, SPONSOR_LIBRARY};
use crate::{MdrError, MdrResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRecord {
    pub name: String,
    pub is_editable: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryRegistry {
    #[serde(default)]
    libraries: Vec<LibraryRecord>,
}

/// Reads and writes the library registry.
#[derive(Clone, Debug)]
pub struct LibraryRepository {
    cfg: Arc<CoreConfig>,
    write_lock: Arc<Mutex<()>>,
}

impl LibraryRepository {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn registry_path(&self) -> PathBuf {
        self.cfg.data_dir().join(LIBRARIES_FILENAME)
    }

    fn load(&self) -> MdrResult<LibraryRegistry> {
        let path = self.registry_path();
        if !path.exists() {
            return Ok(LibraryRegistry::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(MdrError::FileRead)?;
        crate::repositories::parse_yaml(&contents, &path)
    }

    fn store(&self, registry: &LibraryRegistry) -> MdrResult<()> {
        let path = self.registry_path();
        let yaml = serde_yaml::to_string(registry).map_err(MdrError::YamlSerialization)?;
        let tmp = path.with_extension("yaml.tmp");
        std::fs::write(&tmp, yaml).map_err(MdrError::FileWrite)?;
        std::fs::rename(&tmp, &path).map_err(MdrError::FileWrite)
    }

    /// All libraries, sorted by name.
    pub fn list(&self) -> MdrResult<Vec<LibraryRecord>> {
        let mut libraries = self.load()?.libraries;
        libraries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(libraries)
    }

    pub fn find_by_name(&self, name: &str) -> MdrResult<Option<LibraryRecord>> {
        Ok(self.load()?.libraries.into_iter().find(|l| l.name == name))
    }

    pub fn library_exists(&self, name: &str) -> MdrResult<bool> {
        Ok(self.find_by_name(name)?.is_some())
    }

    /// Editability of `name`, or `None` for an unknown library.
    pub fn is_editable(&self, name: &str) -> MdrResult<Option<bool>> {
        Ok(self.find_by_name(name)?.map(|l| l.is_editable))
    }

    pub fn create(&self, name: &str, is_editable: bool) -> MdrResult<LibraryRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MdrError::Validation("library name must not be empty".into()));
        }

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut registry = self.load()?;
        if registry.libraries.iter().any(|l| l.name == name) {
            return Err(MdrError::AlreadyExists(format!(
                "Library with name ({name}) already exists."
            )));
        }
        let record = LibraryRecord {
            name: name.to_string(),
            is_editable,
        };
        registry.libraries.push(record.clone());
        self.store(&registry)?;
        tracing::info!(library = name, is_editable, "library created");
        Ok(record)
    }

    /// Seed the editable Sponsor library and the read-only CDISC library when missing.
    pub fn ensure_defaults(&self) -> MdrResult<()> {
        for (name, is_editable) in [(SPONSOR_LIBRARY, true), (CDISC_LIBRARY, false)] {
            if !self.library_exists(name)? {
                self.create(name, is_editable)?;
            }
        }
        Ok(())
    }
}
