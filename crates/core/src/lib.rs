//! # MDR Core
//!
//! Core business logic for the clinical metadata repository.
//!
//! This crate contains the versioned library item engine and its file-backed storage:
//! - Library item aggregates with the Draft / Final / Retired lifecycle
//! - Entity value objects and their business validation
//! - One Git repository per item under sharded directories of `MDR_DATA_DIR`
//!
//! **No API concerns**: HTTP servers, request extraction and response shapes belong in
//! `api-rest` or `api-shared`.

pub mod author;
pub mod config;
pub mod constants;
pub mod diff;
pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
pub(crate) mod versioned_files;
pub mod versioning;

pub use author::Author;
pub use config::{data_dir_from_env_value, CoreConfig};
pub use constants::DEFAULT_MDR_DATA_DIR;
pub use error::{MdrError, MdrResult};
pub use repositories::{ItemFilter, LibraryRecord, Page, VersionSelector};
pub use services::{LibraryItemService, MdrServices, VersionHistoryEntry};
pub use versioning::{
    ItemKind, LibraryItem, LibraryItemMetadataVO, LibraryItemStatus, LibraryItemValue, LibraryVO,
    ObjectAction,
};
