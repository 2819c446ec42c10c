use crate::error::{ApiError, ApiResult};
use crate::sessions::{session_from_headers, SESSION_HEADER};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::{Html, IntoResponse},
    Json,
};
use chrono::{DateTime, Utc};
use fenrir_core::{AnalysisRequest, AnalysisResult};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Characters of a credential shown by the debug endpoint
const CREDENTIAL_PREVIEW_CHARS: usize = 8;

#[derive(Debug, Deserialize)]
pub struct AnalyzeBody {
    #[serde(default)]
    pub problem: String,
    #[serde(default)]
    pub solution: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub session_id: Uuid,
    pub result: String,
    pub keywords: Vec<String>,
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DebugInfo {
    pub message: String,
    pub provider: String,
    pub model: String,
    pub project_id: Option<String>,
    pub location: String,
    pub endpoint_id: Option<String>,
    pub model_available: bool,
    pub credentials_preview: String,
    pub concept_count: usize,
    pub active_sessions: usize,
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[instrument(skip_all)]
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AnalyzeBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let session_id = session_from_headers(&headers)?.unwrap_or_else(Uuid::new_v4);
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let request = AnalysisRequest::new(body.problem, body.solution)?;

    let outcome = state.pipeline.analyze(&request).await?;
    let warnings = outcome.warnings();
    state.sessions.store(session_id, outcome.result.clone());
    info!(%session_id, "Stored analysis result");

    let AnalysisResult {
        text,
        keywords,
        created_at,
        ..
    } = outcome.result;

    Ok((
        [(SESSION_HEADER, session_id.to_string())],
        Json(AnalyzeResponse {
            session_id,
            result: text,
            keywords,
            warnings,
            created_at,
        }),
    ))
}

pub async fn last_result(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<AnalysisResult>> {
    let session_id = session_from_headers(&headers)?
        .ok_or_else(|| ApiError::NotFound(format!("no {} header supplied", SESSION_HEADER)))?;

    state
        .sessions
        .get(&session_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no result for session {}", session_id)))
}

pub async fn debug_info(State(state): State<AppState>) -> Json<DebugInfo> {
    let llm = &state.config.llm;
    let credential = llm.access_token.as_ref().or(llm.api_key.as_ref());
    let provider = state.pipeline.provider();

    Json(DebugInfo {
        message: "Debug endpoint is working".to_string(),
        provider: provider.provider_name().to_string(),
        model: provider.model_name().to_string(),
        project_id: llm.project_id.clone(),
        location: llm.location.clone(),
        endpoint_id: llm.endpoint_id.clone(),
        model_available: provider.is_available().await,
        credentials_preview: credential_preview(credential),
        concept_count: state.pipeline.store().len(),
        active_sessions: state.sessions.len(),
    })
}

fn credential_preview(secret: Option<&SecretString>) -> String {
    match secret {
        Some(secret) => {
            let head: String = secret
                .expose_secret()
                .chars()
                .take(CREDENTIAL_PREVIEW_CHARS)
                .collect();
            format!("{}... (truncated)", head)
        }
        None => "not set".to_string(),
    }
}
