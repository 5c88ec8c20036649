use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the follow-up document service
///
/// Loads `.env`, initialises logging and serves the REST API.
///
/// # Environment Variables
/// - `FOLLOWUP_REST_ADDR`: REST server address (default: "127.0.0.1:8000")
/// - `FOLLOWUP_DATA_DIR`: Directory holding `physicians.json` (default: "data")
/// - `FOLLOWUP_TEMPLATE_FILE`: Word template for follow-up notes
/// - `FOLLOWUP_OUTPUT_DIR`: Directory for generated DOCX/PDF files (default: "PRC_Files_Folder")
/// - `FOLLOWUP_WEBDRIVER_URL`: chromedriver endpoint used for portal uploads
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("followup_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("followup_core=info".parse()?)
                .add_directive("followup_portal=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (rest_addr, app) = api_rest::app_from_lookup(|key| std::env::var(key).ok())?;

    tracing::info!("++ Starting follow-up REST on {}", rest_addr);
    api_rest::serve(&rest_addr, app).await?;

    Ok(())
}
