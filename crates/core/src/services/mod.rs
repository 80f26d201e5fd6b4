//! Request orchestration over the repositories.
//!
//! Services hold no request state. One [`MdrServices`] is built at startup and cloned into
//! whichever API layer serves it.

mod item_service;

pub use item_service::{LibraryItemService, VersionHistoryEntry};

use crate::config::CoreConfig;
use crate::entities::{ActivityGroupVO, ActivityVO, CtTermAttributesVO, OdmFormVO, SyntaxTemplateVO};
use crate::repositories::LibraryRepository;
use crate::MdrResult;
use std::sync::Arc;

/// Every service of the repository, sharing one configuration and library registry.
#[derive(Clone, Debug)]
pub struct MdrServices {
    pub cfg: Arc<CoreConfig>,
    pub libraries: LibraryRepository,
    pub activities: LibraryItemService<ActivityVO>,
    pub activity_groups: LibraryItemService<ActivityGroupVO>,
    pub ct_terms: LibraryItemService<CtTermAttributesVO>,
    pub odm_forms: LibraryItemService<OdmFormVO>,
    pub syntax_templates: LibraryItemService<SyntaxTemplateVO>,
}

impl MdrServices {
    /// Build the services and seed the default libraries.
    pub fn new(cfg: Arc<CoreConfig>) -> MdrResult<Self> {
        let libraries = LibraryRepository::new(cfg.clone());
        libraries.ensure_defaults()?;
        Ok(Self {
            activities: LibraryItemService::new(cfg.clone(), libraries.clone()),
            activity_groups: LibraryItemService::new(cfg.clone(), libraries.clone()),
            ct_terms: LibraryItemService::new(cfg.clone(), libraries.clone()),
            odm_forms: LibraryItemService::new(cfg.clone(), libraries.clone()),
            syntax_templates: LibraryItemService::new(cfg.clone(), libraries.clone()),
            libraries,
            cfg,
        })
    }
}
