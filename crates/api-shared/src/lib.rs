//! # API Shared
//!
//! Shared definitions for MDR APIs.
//!
//! Contains:
//! - Request and response models (`models` module) with their OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest`; nothing here depends on an HTTP framework.

pub mod health;
pub mod models;

pub use health::HealthService;
pub use models::*;
