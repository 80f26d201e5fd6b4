//! Library item status, actions and version metadata.
//!
//! [`LibraryItemMetadataVO`] is immutable: every transition returns a new instance and the
//! aggregate swaps it in with a single assignment.

use crate::author::Author;
use crate::constants::INITIAL_VERSION_DESCRIPTION;
use crate::{MdrError, MdrResult};
use chrono::{DateTime, Utc};
use mdr_types::VersionNumber;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of one version of a library item.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum LibraryItemStatus {
    Final,
    Draft,
    Retired,
}

impl LibraryItemStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Final => "Final",
            Self::Draft => "Draft",
            Self::Retired => "Retired",
        }
    }
}

impl fmt::Display for LibraryItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LibraryItemStatus {
    type Err = MdrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "final" => Ok(Self::Final),
            "draft" => Ok(Self::Draft),
            "retired" => Ok(Self::Retired),
            other => Err(MdrError::Validation(format!(
                "unknown status '{other}', expected one of Final, Draft, Retired"
            ))),
        }
    }
}

/// Operations a client may perform on the current version of an item.
///
/// Variant order is alphabetical so sorted sets serialise alphabetically.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectAction {
    Approve,
    Delete,
    Edit,
    Inactivate,
    NewVersion,
    Reactivate,
}

impl ObjectAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Delete => "delete",
            Self::Edit => "edit",
            Self::Inactivate => "inactivate",
            Self::NewVersion => "new_version",
            Self::Reactivate => "reactivate",
        }
    }
}

/// Version metadata attached to every saved version of a library item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MetadataRecord")]
pub struct LibraryItemMetadataVO {
    change_description: String,
    status: LibraryItemStatus,
    author: String,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    major_version: u32,
    minor_version: u32,
}

/// Unchecked wire form, validated through [`LibraryItemMetadataVO::from_repository_values`].
#[derive(Deserialize)]
struct MetadataRecord {
    change_description: String,
    status: LibraryItemStatus,
    author: String,
    start_date: DateTime<Utc>,
    #[serde(default)]
    end_date: Option<DateTime<Utc>>,
    major_version: u32,
    minor_version: u32,
}

impl TryFrom<MetadataRecord> for LibraryItemMetadataVO {
    type Error = MdrError;

    fn try_from(r: MetadataRecord) -> Result<Self, Self::Error> {
        Self::from_repository_values(
            r.change_description,
            r.status,
            r.author,
            r.start_date,
            r.end_date,
            r.major_version,
            r.minor_version,
        )
    }
}

impl LibraryItemMetadataVO {
    /// Metadata of a freshly created item: `0.1`, Draft, "Initial version".
    pub fn initial(author: &Author) -> Self {
        Self {
            change_description: INITIAL_VERSION_DESCRIPTION.to_string(),
            status: LibraryItemStatus::Draft,
            author: author.name().to_string(),
            start_date: Utc::now(),
            end_date: None,
            major_version: 0,
            minor_version: 1,
        }
    }

    /// Rebuild metadata read back from storage.
    ///
    /// # Errors
    ///
    /// Returns [`MdrError::CorruptMetadata`] for version `0.0`.
    pub fn from_repository_values(
        change_description: String,
        status: LibraryItemStatus,
        author: String,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
        major_version: u32,
        minor_version: u32,
    ) -> MdrResult<Self> {
        if major_version == 0 && minor_version == 0 {
            return Err(MdrError::CorruptMetadata(
                "version 0.0 is not a valid library item version".into(),
            ));
        }
        Ok(Self {
            change_description,
            status,
            author,
            start_date,
            end_date,
            major_version,
            minor_version,
        })
    }

    pub fn change_description(&self) -> &str {
        &self.change_description
    }

    pub fn status(&self) -> LibraryItemStatus {
        self.status
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    pub fn major_version(&self) -> u32 {
        self.major_version
    }

    pub fn minor_version(&self) -> u32 {
        self.minor_version
    }

    pub fn version_number(&self) -> VersionNumber {
        VersionNumber::new(self.major_version, self.minor_version)
    }

    /// Version label, always `"{major}.{minor}"`.
    pub fn version(&self) -> String {
        self.version_number().to_string()
    }

    /// Copy of this metadata closed at `end_date`. Used when presenting history.
    pub fn closed_at(&self, end_date: DateTime<Utc>) -> Self {
        Self {
            end_date: Some(end_date),
            ..self.clone()
        }
    }

    fn next_version(&self, new_status: LibraryItemStatus) -> (u32, u32) {
        use LibraryItemStatus::*;
        match (self.status, new_status) {
            (Draft, Final) => (self.major_version + 1, 0),
            (Draft, Draft) => (self.major_version, self.minor_version + 1),
            (Final | Retired, Draft) => (self.major_version, 1),
            (Final, Final) | (Retired, Retired) => (self.major_version + 1, self.minor_version),
            _ => (self.major_version, self.minor_version),
        }
    }

    fn transition(
        &self,
        new_status: LibraryItemStatus,
        author: &Author,
        change_description: &str,
    ) -> Self {
        let (major_version, minor_version) = self.next_version(new_status);
        Self {
            change_description: change_description.to_string(),
            status: new_status,
            author: author.name().to_string(),
            start_date: Utc::now(),
            end_date: None,
            major_version,
            minor_version,
        }
    }

    pub fn new_draft_version(&self, author: &Author, change_description: &str) -> MdrResult<Self> {
        match self.status {
            LibraryItemStatus::Draft | LibraryItemStatus::Final => {
                Ok(self.transition(LibraryItemStatus::Draft, author, change_description))
            }
            LibraryItemStatus::Retired => {
                Err(MdrError::versioning("Cannot create new Draft version"))
            }
        }
    }

    pub fn new_final_version(&self, author: &Author, change_description: &str) -> MdrResult<Self> {
        match self.status {
            LibraryItemStatus::Draft | LibraryItemStatus::Retired => {
                Ok(self.transition(LibraryItemStatus::Final, author, change_description))
            }
            LibraryItemStatus::Final => {
                Err(MdrError::versioning("The object is not in draft status."))
            }
        }
    }

    pub fn new_retired_version(
        &self,
        author: &Author,
        change_description: &str,
    ) -> MdrResult<Self> {
        match self.status {
            LibraryItemStatus::Final => {
                Ok(self.transition(LibraryItemStatus::Retired, author, change_description))
            }
            _ => Err(MdrError::versioning("Cannot retire draft version.")),
        }
    }
}
