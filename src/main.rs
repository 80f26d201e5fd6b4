use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mdr_core::{Author, CoreConfig, MdrServices, constants::DEFAULT_AUTHOR_NAME, data_dir_from_env_value};

/// Main entry point for the MDR application
///
/// Resolves configuration once, seeds the default libraries and serves the REST API.
///
/// # Environment Variables
/// - `MDR_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MDR_DATA_DIR`: Directory for library item storage (default: "mdr_data")
/// - `MDR_DEFAULT_AUTHOR`: Author recorded when a request sends no `x-author-name`
///   (default: "unknown-user")
/// - `MDR_DEFAULT_AUTHOR_EMAIL`: Email of the default author
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mdr_run=info".parse()?)
                .add_directive("mdr_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("MDR_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = data_dir_from_env_value(std::env::var("MDR_DATA_DIR").ok());
    let author_name =
        std::env::var("MDR_DEFAULT_AUTHOR").unwrap_or_else(|_| DEFAULT_AUTHOR_NAME.into());
    let author_email = std::env::var("MDR_DEFAULT_AUTHOR_EMAIL").ok();

    let cfg = Arc::new(CoreConfig::new(
        data_dir,
        Author::new(author_name, author_email.as_deref())?,
    )?);
    tracing::info!("++ MDR data directory {}", cfg.data_dir().display());

    let services = MdrServices::new(cfg)?;
    let rest_app = api_rest::router(services);

    tracing::info!("++ Starting MDR REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, rest_app).await?;

    Ok(())
}
