//! Constants used throughout the MDR core crate.
//!
//! Path and filename constants live here so storage layout is defined in one place.

/// Default directory for MDR data when no explicit directory is configured.
pub const DEFAULT_MDR_DATA_DIR: &str = "mdr_data";

/// Filename of the library registry under the data directory.
pub const LIBRARIES_FILENAME: &str = "libraries.yaml";

/// Filename of the latest snapshot inside each item directory.
pub const ITEM_FILENAME: &str = "item.yaml";

/// Author recorded when a request does not identify one.
pub const DEFAULT_AUTHOR_NAME: &str = "unknown-user";

/// Email used for git signatures when the author has none.
pub const DEFAULT_AUTHOR_EMAIL: &str = "unknown-user@mdr.invalid";

/// Library seeded as editable on first start.
pub const SPONSOR_LIBRARY: &str = "Sponsor";

/// Library seeded as non-editable on first start.
pub const CDISC_LIBRARY: &str = "CDISC";

pub const DEFAULT_GITIGNORE: &str = ".DS_Store\n";

/// Change descriptions used when a caller does not supply one.
pub const INITIAL_VERSION_DESCRIPTION: &str = "Initial version";
pub const APPROVED_VERSION_DESCRIPTION: &str = "Approved version";
pub const NEW_DRAFT_DESCRIPTION: &str = "New draft created";
pub const INACTIVATED_VERSION_DESCRIPTION: &str = "Inactivated version";
pub const REACTIVATED_VERSION_DESCRIPTION: &str = "Reactivated version";
pub const DELETED_DESCRIPTION: &str = "Deleted";

/// Default page size for listings and audit trails.
pub const DEFAULT_PAGE_SIZE: usize = 10;
