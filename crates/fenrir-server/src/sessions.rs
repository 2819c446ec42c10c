use axum::http::HeaderMap;
use dashmap::DashMap;
use fenrir_core::AnalysisResult;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the caller's session id
pub const SESSION_HEADER: &str = "x-session-id";

/// Last successful result per session.
///
/// Sessions never see each other's results, and a failed analysis leaves the
/// stored entry untouched.
#[derive(Debug, Default)]
pub struct SessionStore {
    results: DashMap<Uuid, AnalysisResult>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, session: &Uuid) -> Option<AnalysisResult> {
        self.results.get(session).map(|entry| entry.value().clone())
    }

    /// Replace the session's result, returning the one it displaced.
    pub fn store(&self, session: Uuid, result: AnalysisResult) -> Option<AnalysisResult> {
        self.results.insert(session, result)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Read the session id from request headers; `None` when the header is absent.
pub fn session_from_headers(headers: &HeaderMap) -> Result<Option<Uuid>, ApiError> {
    let Some(raw) = headers.get(SESSION_HEADER) else {
        return Ok(None);
    };

    let text = raw
        .to_str()
        .map_err(|_| ApiError::BadRequest(format!("{} is not valid text", SESSION_HEADER)))?;
    Uuid::parse_str(text.trim())
        .map(Some)
        .map_err(|e| ApiError::BadRequest(format!("{} is not a UUID: {}", SESSION_HEADER, e)))
}
