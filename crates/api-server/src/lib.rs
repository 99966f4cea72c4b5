//! HTTP boundary for the ticker report service.

use anyhow::Context;
use axum::{
    extract::State,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use market_core::{QuoteSource, TextGenerator};
use polygon_client::PolygonClient;
use report_engine::ReportOrchestrator;
use serde_json::json;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use textgen_client::HuggingFaceClient;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod report_routes;
pub mod request_id;
pub mod security_headers;

pub use config::AppConfig;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ReportOrchestrator>,
    pub default_lookback_days: u64,
    pub enable_hsts: bool,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let quotes: Arc<dyn QuoteSource> = Arc::new(
            PolygonClient::new(config.polygon.clone()).context("Failed to create Polygon client")?,
        );

        let generator: Option<Arc<dyn TextGenerator>> = match &config.generation {
            Some(generation) => {
                let client = HuggingFaceClient::new(generation.clone())
                    .context("Failed to create text generation client")?;
                tracing::info!("AI reports enabled (model: {})", client.model());
                Some(Arc::new(client))
            }
            None => {
                tracing::info!("HUGGING_FACE_TOKEN not configured; using local analysis only");
                None
            }
        };

        Ok(Self {
            orchestrator: Arc::new(ReportOrchestrator::new(quotes, generator)),
            default_lookback_days: config.default_lookback_days,
            enable_hsts: config.enable_hsts,
        })
    }
}

/// Handler error carrying the HTTP status to answer with.
///
/// 4xx responses echo the error message; 5xx responses log the full chain and
/// return only `public_message`.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    public_message: Option<&'static str>,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self {
            status,
            public_message: None,
            error,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!(message.into()))
    }

    pub fn internal(public_message: &'static str, error: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            public_message: Some(public_message),
            error,
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::internal("Internal server error", err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.status.is_server_error() {
            tracing::error!("{}: {:#}", self.public_message.unwrap_or("Internal server error"), self.error);
            self.public_message.unwrap_or("Internal server error").to_string()
        } else {
            tracing::debug!("Rejected request ({}): {}", self.status, self.error);
            self.error.to_string()
        };

        (self.status, Json(json!({ "error": message }))).into_response()
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "aiEnabled": state.orchestrator.ai_enabled(),
    }))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

/// Assemble routes and middleware. Split out from `run_server` so tests can
/// drive the router with in-memory backends.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(report_routes::report_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers::security_headers_middleware,
        ))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<axum::body::Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // try_init: a second call (e.g. from tests) keeps the first subscriber
    let result = if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };
    if let Err(e) = result {
        eprintln!("tracing already initialised: {}", e);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let state = AppState::from_config(&config)?;
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server running on http://{}", addr);
    tracing::info!(
        "Quote API: {} | AI reports: {}",
        config.polygon.base_url,
        if config.ai_enabled() { "enabled" } else { "disabled" }
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
