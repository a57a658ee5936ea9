use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::analysis::AnalysisError;

/// Errors returned to HTTP clients as `{"detail": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("bad_quality")]
    BadQuality,
    #[error("model_error")]
    ModelFailure,
    #[error("internal_error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::BadQuality => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ModelFailure => StatusCode::BAD_GATEWAY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::InvalidImage(inner) => {
                ApiError::BadRequest(format!("Could not decode image: {inner}"))
            }
            AnalysisError::Quality(_) => ApiError::BadQuality,
            AnalysisError::Model(inner) => {
                warn!("Model failure surfaced to client: {inner}");
                ApiError::ModelFailure
            }
            AnalysisError::Worker(inner) => {
                error!("Image analysis task failed: {inner}");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
