//! # API REST
//!
//! REST API for the follow-up document service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, error mapping, CORS, request tracing)
//!
//! Business logic lives in `followup-core`; portal automation in `followup-portal`.

#![warn(rust_2018_idioms)]

mod error;
mod handlers;
pub mod models;

pub use error::{ApiError, ApiResult};

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use followup_core::{
    converter_from_config, CoreConfig, DocumentService, FollowUpResult, PdfConverter,
    PhysicianRegistry,
};
use followup_portal::{DocumentUploader, PortalConfig, WebDriverUploader};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub const REST_ADDR_KEY: &str = "FOLLOWUP_REST_ADDR";
pub const DEFAULT_REST_ADDR: &str = "127.0.0.1:8000";
pub const CORS_ORIGIN_KEY: &str = "FOLLOWUP_CORS_ORIGIN";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub physicians: Arc<PhysicianRegistry>,
    pub documents: DocumentService,
    pub uploader: Arc<dyn DocumentUploader>,
}

impl AppState {
    /// Builds the state with the PDF converter selected by `cfg`.
    pub fn new(cfg: Arc<CoreConfig>, uploader: Arc<dyn DocumentUploader>) -> FollowUpResult<Self> {
        let converter = converter_from_config(&cfg);
        Self::with_converter(cfg, converter, uploader)
    }

    pub fn with_converter(
        cfg: Arc<CoreConfig>,
        converter: Arc<dyn PdfConverter>,
        uploader: Arc<dyn DocumentUploader>,
    ) -> FollowUpResult<Self> {
        let physicians = Arc::new(PhysicianRegistry::open(cfg.physicians_file())?);
        let documents = DocumentService::new(cfg.clone(), converter);
        Ok(Self {
            cfg,
            physicians,
            documents,
            uploader,
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root,
        handlers::health,
        handlers::list_physicians,
        handlers::add_physician,
        handlers::generate_doc,
        handlers::upload_documents,
    ),
    components(schemas(
        models::MessageRes,
        models::HealthRes,
        models::ErrorRes,
        models::AddPhysicianReq,
        models::AddPhysicianRes,
        models::GenerateDocReq,
        models::UploadDocumentsReq,
        models::UploadDocumentsRes,
        models::UploadedDocument,
    ))
)]
pub struct ApiDoc;

/// CORS policy allowing the single front-end `origin`.
///
/// `Content-Disposition` is exposed so browsers can read the download name.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, axum::http::header::InvalidHeaderValue> {
    Ok(CorsLayer::new()
        .allow_origin(HeaderValue::from_str(origin)?)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .expose_headers([CONTENT_DISPOSITION]))
}

/// Builds the router with every endpoint plus Swagger UI.
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            "/physicians",
            get(handlers::list_physicians).post(handlers::add_physician),
        )
        .route("/add-physician", post(handlers::add_physician))
        .route("/generate-doc", post(handlers::generate_doc))
        .route("/upload-documents", post(handlers::upload_documents))
        .route("/upload-documents/", post(handlers::upload_documents))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Resolves all configuration through `lookup` and builds the application.
///
/// Creates the data, output and RAW directories. A missing template is only logged: it is
/// reported per request so the physician endpoints stay usable.
///
/// # Returns
/// The listen address and the ready router.
///
/// # Errors
/// Returns an error if:
/// - a configuration value is malformed,
/// - the working directories or the physician store cannot be created, or
/// - the CORS origin is not a valid header value.
pub fn app_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<(String, Router)> {
    let cfg = Arc::new(CoreConfig::from_lookup(&lookup)?);
    let portal_cfg = Arc::new(PortalConfig::from_lookup(&lookup)?);
    cfg.ensure_dirs()?;

    if !cfg.template_file().is_file() {
        tracing::warn!("template not found at {}", cfg.template_file().display());
    }
    match cfg.pdf_converter() {
        Some(binary) => tracing::info!("PDF conversion with {}", binary.display()),
        None => tracing::info!("PDF conversion disabled"),
    }
    tracing::info!(
        "documents in {}, RAW files in {}, portal {}",
        cfg.output_dir().display(),
        cfg.raw_dir().display(),
        portal_cfg.portal_url
    );

    let addr = lookup(REST_ADDR_KEY).unwrap_or_else(|| DEFAULT_REST_ADDR.into());
    let origin = lookup(CORS_ORIGIN_KEY).unwrap_or_else(|| DEFAULT_CORS_ORIGIN.into());
    let cors = cors_layer(&origin)
        .map_err(|e| anyhow::anyhow!("{CORS_ORIGIN_KEY} '{origin}' is not a valid origin: {e}"))?;

    let uploader = Arc::new(WebDriverUploader::new(portal_cfg));
    let state = AppState::new(cfg, uploader)?;

    Ok((addr, router(state, cors)))
}

/// Serves `app` on `addr` until Ctrl-C.
pub async fn serve(addr: &str, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("++ Follow-up REST API listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("-- shutting down REST API");
}
