//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own, without the workspace runner.
//!
//! ## Intended use
//! Useful for development and debugging of the HTTP layer. The workspace's main `mdr-run`
//! binary serves the same router.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mdr_core::{data_dir_from_env_value, Author, CoreConfig, MdrServices};

/// Main entry point for the MDR REST API server
///
/// # Environment Variables
/// - `MDR_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `MDR_DATA_DIR`: Storage directory (default: "mdr_data")
/// - `MDR_DEFAULT_AUTHOR`, `MDR_DEFAULT_AUTHOR_EMAIL`: author used when requests name none
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("mdr_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MDR_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = data_dir_from_env_value(std::env::var("MDR_DATA_DIR").ok());
    let author_name = std::env::var("MDR_DEFAULT_AUTHOR")
        .unwrap_or_else(|_| mdr_core::constants::DEFAULT_AUTHOR_NAME.into());
    let author_email = std::env::var("MDR_DEFAULT_AUTHOR_EMAIL").ok();
    let default_author = Author::new(author_name, author_email.as_deref())?;

    let cfg = Arc::new(CoreConfig::new(data_dir, default_author)?);
    let services = MdrServices::new(cfg)?;

    tracing::info!("-- Starting MDR REST API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, api_rest::router(services)).await?;

    Ok(())
}
