//! HTTP API
//!
//! JSON endpoints over the session store:
//!
//! - `GET  /` - banner
//! - `GET  /health` - liveness and build info
//! - `POST /start-interview` - create a session and return the first question
//! - `POST /submit-answer` - answer the pending question
//! - `GET  /session/:id/status` - progress counters
//! - `GET  /session/:id/summary` - score summary so far
//! - `GET  /session/:id/report` - final report of a completed session

use crate::catalog;
use crate::config::{Config, InterviewConfig, ServerConfig};
use crate::session::{Collaborators, InterviewSession, SessionId, SessionStore};
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sdk::errors::{EngineError, GaugeErrorExt};
use sdk::report::{AssessmentReport, ScoreSummary};
use sdk::types::{QuestionFormat, SessionState, SkillArea};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// How often idle sessions are swept while serving
const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub collaborators: Collaborators,
    pub interview: InterviewConfig,
}

impl AppState {
    pub fn new(store: Arc<SessionStore>, collaborators: Collaborators, interview: InterviewConfig) -> Self {
        Self {
            store,
            collaborators,
            interview,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub candidate_name: String,
    #[serde(default = "default_position_level")]
    pub position_level: String,
}

fn default_position_level() -> String {
    "intermediate".to_string()
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub session_id: String,
    pub answer: String,
}

/// Response of the start and submit endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct InterviewResponse {
    pub session_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,
    pub question: Option<String>,
    pub question_format: Option<QuestionFormat>,
    pub skill_area: Option<SkillArea>,
    pub options: Option<[String; 4]>,
    /// Score of the answer just submitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub is_complete: bool,
    pub assessment_result: Option<AssessmentReport>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub session_id: String,
    pub state: SessionState,
    pub summary: ScoreSummary,
}

/// Error returned by handlers
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Engine(EngineError),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err)
    }
}

/// HTTP status for an engine error
pub fn status_for(err: &EngineError) -> StatusCode {
    match err {
        EngineError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidState { .. }
        | EngineError::NoPendingQuestion
        | EngineError::NotComplete
        | EngineError::SessionBusy(_) => StatusCode::CONFLICT,
        EngineError::StoreFull { .. } => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::LLMTimeout => StatusCode::GATEWAY_TIMEOUT,
        EngineError::Collaborator { .. }
        | EngineError::LLMProvider(_)
        | EngineError::AllProvidersExhausted
        | EngineError::Network(_) => StatusCode::BAD_GATEWAY,
        EngineError::InvalidPlan(_) | EngineError::Config(_) => StatusCode::BAD_REQUEST,
        EngineError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": message, "hint": "Check the request body"})),
            )
                .into_response(),
            ApiError::Engine(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    tracing::error!("Request failed: {}", err);
                } else {
                    tracing::debug!("Request rejected: {}", err);
                }
                (
                    status,
                    Json(json!({"error": err.to_string(), "hint": err.user_hint()})),
                )
                    .into_response()
            }
        }
    }
}

/// Build the API router
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/start-interview", post(start_handler))
        .route("/submit-answer", post(submit_handler))
        .route("/session/:id/status", get(status_handler))
        .route("/session/:id/summary", get(summary_handler))
        .route("/session/:id/report", get(report_handler))
        .layer(cors_layer(&server.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Bind and serve until Ctrl+C
pub async fn serve(config: &Config, collaborators: Collaborators) -> Result<(), EngineError> {
    let store = Arc::new(SessionStore::from_config(&config.sessions));
    let state = AppState::new(Arc::clone(&store), collaborators, config.interview.clone());
    let app = router(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| EngineError::Network(format!("Failed to bind to {}: {}", addr, e)))?;

    let sweeper = tokio::spawn(async move {
        let mut interval = tokio::time::interval(EVICTION_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = store.evict_expired();
            if evicted > 0 {
                tracing::info!("Evicted {} idle sessions", evicted);
            }
        }
    });

    tracing::info!("Gauge API listening on http://{}", addr);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("API server shutting down gracefully");
        })
        .await
        .map_err(|e| EngineError::Network(format!("API server error: {}", e)));

    sweeper.abort();
    result
}

async fn index_handler() -> impl IntoResponse {
    Json(json!({
        "message": "Gauge Skills Interview API",
        "status": "running"
    }))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "commit": env!("GIT_COMMIT_HASH"),
    }))
}

async fn start_handler(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> Result<Json<InterviewResponse>, ApiError> {
    let candidate_name = request.candidate_name.trim();
    if candidate_name.is_empty() {
        return Err(ApiError::BadRequest(
            "candidate_name must not be empty".to_string(),
        ));
    }

    let level = catalog::resolve_level(&request.position_level);
    let session = InterviewSession::for_level(
        candidate_name,
        level,
        &state.interview,
        state.collaborators.clone(),
    );
    let id = state.store.insert(session)?;

    let mut session = state.store.acquire(id)?;
    let outcome = session.start().await?;

    Ok(Json(InterviewResponse {
        session_id: id.to_string(),
        message: outcome.welcome_message,
        transition: None,
        question: Some(outcome.question.text),
        question_format: Some(outcome.question.format),
        skill_area: Some(outcome.question.skill_area),
        options: outcome.question.options,
        score: None,
        is_complete: false,
        assessment_result: None,
    }))
}

async fn submit_handler(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<InterviewResponse>, ApiError> {
    let id: SessionId = request.session_id.parse()?;
    let mut session = state.store.acquire(id)?;
    let outcome = session.submit_answer(&request.answer).await?;

    let assessment_result = if outcome.is_complete {
        Some(session.finalize().await?)
    } else {
        None
    };

    let (question, question_format, skill_area, options) = match outcome.next_question {
        Some(view) => (
            Some(view.text),
            Some(view.format),
            Some(view.skill_area),
            view.options,
        ),
        None => (None, None, None, None),
    };

    Ok(Json(InterviewResponse {
        session_id: id.to_string(),
        message: outcome.message,
        transition: outcome.transition,
        question,
        question_format,
        skill_area,
        options,
        score: Some(outcome.score),
        is_complete: outcome.is_complete,
        assessment_result,
    }))
}

async fn status_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: SessionId = id.parse()?;
    let session = state.store.acquire(id)?;
    Ok(Json(session.status()))
}

async fn summary_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: SessionId = id.parse()?;
    let session = state.store.acquire(id)?;
    Ok(Json(SummaryResponse {
        session_id: id.to_string(),
        state: session.state(),
        summary: session.summary(),
    }))
}

async fn report_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: SessionId = id.parse()?;
    let mut session = state.store.acquire(id)?;
    Ok(Json(session.finalize().await?))
}
