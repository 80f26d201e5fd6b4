//! The versioned-object lifecycle engine.
//!
//! Every library item moves through the same state machine:
//!
//! ```text
//! Draft 0.1 --approve--> Final 1.0 --create_new_version--> Draft 1.1 --edit_draft--> Draft 1.2
//!                          |   ^                                                       |
//!                 inactivate   reactivate                                 approve -> Final 2.0
//!                          v   |
//!                        Retired 1.0
//! ```
//!
//! Drafts that were never approved (major version 0) can be soft deleted.

mod aggregate;
mod library;
mod metadata;
mod validator;
mod value;

pub use aggregate::{LibraryItem, RepositoryClosure};
pub use library::LibraryVO;
pub use metadata::{LibraryItemMetadataVO, LibraryItemStatus, ObjectAction};
pub use validator::ReferenceValidator;
pub use value::{ItemKind, LibraryItemValue};

#[cfg(test)]
pub(crate) use validator::testing;
