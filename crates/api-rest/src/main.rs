//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own, configured from the environment (and `.env`).
//!
//! ## Intended use
//! Useful for development when only the REST server (with OpenAPI/Swagger UI) is wanted. The
//! workspace's main `followup-run` binary serves the same application.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the follow-up REST API server
///
/// # Environment Variables
/// - `FOLLOWUP_REST_ADDR`: Server address (default: "127.0.0.1:8000")
/// - `FOLLOWUP_CORS_ORIGIN`: Allowed front-end origin (default: "http://localhost:3000")
/// - `FOLLOWUP_*`: storage, template, PDF and portal settings
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
                .add_directive("followup_core=info".parse()?)
                .add_directive("followup_portal=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (addr, app) = api_rest::app_from_lookup(|key| std::env::var(key).ok())?;

    tracing::info!("-- Starting follow-up REST API on {}", addr);
    api_rest::serve(&addr, app).await?;

    Ok(())
}
