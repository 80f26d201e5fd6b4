//! Library item identifiers and sharded storage paths.
//!
//! Every library item (activity, CT term, ODM form, template, ...) is identified by a uid that
//! is assigned once at creation and never changes. The MDR uses a *canonical* UUID
//! representation for these uids: **32 lowercase hexadecimal characters** (no hyphens).
//!
//! Items are stored under sharded directories derived from the uid:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`, for example
//! `mdr_data/activities/55/0e/550e8400e29b41d4a716446655440000/`.
//!
//! Sharding keeps the fan-out of any single directory small as libraries grow.

mod service;

pub use service::{Uuid, UuidService};

/// Error type for uid operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for uid operations.
pub type UuidResult<T> = Result<T, UuidError>;
