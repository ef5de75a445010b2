//! HTTP API gateway for Askbook.
//!
//! Exposes the ask flow over REST: ask a question (POST body or query
//! string), fetch a stored answer by ID, and the "feeling lucky" shortcut.
//!
//! Built on Axum.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::{Path, Query, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use askbook_config::AppConfig;
use askbook_core::cache::PreviousAnswer;
use askbook_core::error::Error;
use askbook_corpus::CorpusStore;
use askbook_pipeline::{AnswerService, AskFlow, AskOutcome, PipelineSettings};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub flow: AskFlow,
}

type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self {
            flow: build_flow(config).await?,
        })
    }
}

/// Build the provider, corpus store, cache and ask flow from config.
pub async fn build_flow(config: &AppConfig) -> Result<AskFlow, Error> {
    let provider = askbook_providers::build_from_config(config)?;
    let corpus = Arc::new(CorpusStore::new(&config.corpus));
    let cache = askbook_cache::build_from_config(&config.cache).await?;

    let service = AnswerService::new(provider, corpus, PipelineSettings::from_config(config));
    Ok(AskFlow::new(
        Arc::new(service),
        cache,
        config.lucky_questions.clone(),
    ))
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - Request body size limit (1 MB)
/// - CORS for GET/POST with JSON bodies
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .route("/ask", get(ask_query_handler).post(ask_handler))
        .route("/question/{id}", get(question_handler))
        .route("/lucky", post(lucky_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = GatewayState::from_config(&config).await?;

    // Load the corpus now so the first request doesn't pay for it.
    match state.flow.service().corpus().get().await {
        Ok(corpus) => info!(sections = corpus.len(), "Corpus ready"),
        Err(e) => warn!(error = %e, "Corpus failed to load; requests will retry"),
    }

    let app = build_router(Arc::new(state));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Errors ---

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// A pipeline error on its way to becoming an HTTP response.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidQuestion(_) => StatusCode::BAD_REQUEST,
            Error::Generation(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, status = status.as_u16(), "Request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    pub id: String,
    pub ask_count: u64,
    pub cached: bool,
}

impl From<AskOutcome> for AskResponse {
    fn from(outcome: AskOutcome) -> Self {
        Self {
            question: outcome.question,
            answer: outcome.answer,
            id: outcome.id,
            ask_count: outcome.ask_count,
            cached: outcome.cached,
        }
    }
}

async fn ask_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    info!(question_len = payload.question.len(), "Ask received");
    let outcome = state.flow.ask(&payload.question).await?;
    Ok(Json(outcome.into()))
}

async fn ask_query_handler(
    State(state): State<SharedState>,
    Query(params): Query<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let outcome = state.flow.ask(&params.question).await?;
    Ok(Json(outcome.into()))
}

async fn lucky_handler(State(state): State<SharedState>) -> Result<Json<AskResponse>, ApiError> {
    let outcome = state.flow.lucky().await?;
    Ok(Json(outcome.into()))
}

async fn question_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<PreviousAnswer>, Response> {
    match state.flow.previous(&id).await {
        Ok(Some(entry)) => Ok(Json(entry)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Question '{id}' not found"),
            }),
        )
            .into_response()),
        Err(e) => Err(ApiError(e).into_response()),
    }
}
