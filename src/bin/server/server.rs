//! HTTP server for document analysis.

use crate::config::{AnalysisConfig, ServerConfig};
use crate::response::AnalysisResponse;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use findoc::analyzer::DocumentAnalyzer;
use findoc::client::{AdeClient, ExtractionService};
use findoc::core::config::{API_KEY_ENV, ApiKey};
use findoc::core::errors::{ConfigError, ExtractionError, FindocError};
use findoc::document::{LazyPdfRasterizer, load_pages};
use findoc::utils::visualization::BoxRenderer;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Application state shared across handlers
struct AppState {
    analysis: AnalysisConfig,
    /// Client for the credential resolved at startup, if any
    default_client: Option<AdeClient>,
    renderer: Arc<BoxRenderer>,
    rasterizer: LazyPdfRasterizer,
}

impl AppState {
    /// Client for one request; a non-blank `api_key` overrides the default credential.
    fn client_for(&self, api_key: Option<String>) -> Result<AdeClient, FindocError> {
        match (&self.default_client, api_key.and_then(ApiKey::new)) {
            (Some(client), Some(key)) => Ok(client.with_api_key(key)),
            (Some(client), None) => Ok(client.clone()),
            (None, Some(key)) => AdeClient::new(self.analysis.extraction(Some(key.expose().to_string()))?),
            (None, None) => Err(ConfigError::MissingApiKey {
                env_var: API_KEY_ENV,
            }
            .into()),
        }
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Fields of an analysis upload
struct Upload {
    filename: String,
    bytes: Vec<u8>,
    api_key: Option<String>,
}

/// An upload that could not be read, with the status to answer it with.
#[derive(Debug)]
struct UploadRejection {
    status: StatusCode,
    message: String,
}

impl UploadRejection {
    fn missing(field: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: format!("missing '{field}' field"),
        }
    }

    /// Keeps the multipart error's own status, 413 for a body over the limit.
    fn multipart(context: &str, e: MultipartError) -> Self {
        Self {
            status: e.status(),
            message: format!("{context}: {}", e.body_text()),
        }
    }
}

/// Run the HTTP server
pub async fn run_server(
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let default_client = match config.analysis.extraction(None) {
        Ok(extraction) => Some(AdeClient::new(extraction)?),
        Err(ConfigError::MissingApiKey { env_var }) => {
            warn!("No default API key ({env_var} unset); requests must provide api_key");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let renderer = Arc::new(config.analysis.renderer());
    info!(builtin_font = renderer.font().is_builtin(), "Box renderer ready");

    let state = Arc::new(AppState {
        rasterizer: config.analysis.rasterizer(),
        analysis: config.analysis,
        default_client,
        renderer,
    });

    let app = router(state, config.max_upload_bytes);

    // Parse address
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    info!("Server listening on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /health         - Health check");
    info!("  POST /analyze        - Document analysis (multipart: file, api_key)");
    info!("  POST /api/v1/analyze - Document analysis (versioned API)");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Routes with CORS, request tracing and the upload size limit.
fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/analyze", post(analyze_handler))
        .route("/api/v1/analyze", post(analyze_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Document analysis endpoint
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> impl IntoResponse {
    let request_id = uuid::Uuid::new_v4().to_string();
    let start = Instant::now();

    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(rejection) => {
            warn!(
                request_id = %request_id,
                status = rejection.status.as_u16(),
                error = %rejection.message,
                "Rejected upload"
            );
            return failure(rejection.status, rejection.message);
        }
    };
    info!(
        request_id = %request_id,
        filename = %upload.filename,
        bytes = upload.bytes.len(),
        "Processing analysis request"
    );

    match analyze_upload(state, upload).await {
        Ok(response) => {
            let total_ms = start.elapsed().as_secs_f64() * 1000.0;
            info!(
                request_id = %request_id,
                pages = response.page_count,
                total_ms,
                "Analysis completed"
            );
            (StatusCode::OK, Json(response))
        }
        Err(e) => {
            let status = status_for(&e);
            error!(request_id = %request_id, status = status.as_u16(), error = %e, "Analysis failed");
            failure(status, e.to_string())
        }
    }
}

async fn analyze_upload(state: Arc<AppState>, upload: Upload) -> Result<AnalysisResponse, FindocError> {
    let Upload {
        filename,
        bytes,
        api_key,
    } = upload;

    // credential problems surface before any rendering or network traffic
    let client = state.client_for(api_key)?;

    let bytes = Arc::new(bytes);
    let pages = {
        let state = Arc::clone(&state);
        let bytes = Arc::clone(&bytes);
        let filename = filename.clone();
        tokio::task::spawn_blocking(move || load_pages(&bytes, &filename, &state.rasterizer))
            .await
            .map_err(join_error)??
    };
    if pages.is_empty() {
        return Err(FindocError::invalid_input("document has no pages"));
    }

    let analyzer = Arc::new(
        DocumentAnalyzer::with_shared_renderer(client, Arc::clone(&state.renderer))
            .with_scaling(state.analysis.scaling),
    );

    let start = Instant::now();
    let response = analyzer.service().parse(&bytes, &filename).await?;

    tokio::task::spawn_blocking(move || {
        let analysis = analyzer.assemble(pages, &response);
        AnalysisResponse::from_analysis(&analysis, true, start.elapsed().as_secs_f64() * 1000.0)
    })
    .await
    .map_err(join_error)?
}

/// Reads the `file` and optional `api_key` fields of a multipart upload.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, UploadRejection> {
    let mut file = None;
    let mut api_key = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadRejection::multipart("malformed multipart body", e))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("document").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| UploadRejection::multipart("failed to read upload", e))?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("api_key") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| UploadRejection::multipart("failed to read api_key", e))?;
                api_key = Some(value);
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or_else(|| UploadRejection::missing("file"))?;
    Ok(Upload {
        filename,
        bytes,
        api_key,
    })
}

fn status_for(error: &FindocError) -> StatusCode {
    match error {
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        FindocError::Extraction(ExtractionError::Staging(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        FindocError::Extraction(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(status: StatusCode, message: String) -> (StatusCode, Json<AnalysisResponse>) {
    (status, Json(AnalysisResponse::error(message)))
}

fn join_error(e: tokio::task::JoinError) -> FindocError {
    FindocError::Io(std::io::Error::other(e))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
