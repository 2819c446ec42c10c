use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fenrir_core::FenrirError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Fenrir(#[from] FenrirError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Fenrir(err) => match err {
                FenrirError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                FenrirError::Synthesis(_) => StatusCode::BAD_GATEWAY,
                FenrirError::ConceptLoad { .. } | FenrirError::ModelInit(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            },
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", status, self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
