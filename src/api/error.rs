use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::ingest::IngestError;

/// Errors returned from handlers, rendered as `{error, message}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// The request was well-formed but the stored installation cannot be analysed
    #[error("Cannot analyse: {0}")]
    Unprocessable(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::ValidationError(_) => "ValidationError",
            ApiError::Unauthorized => "Unauthorized",
            ApiError::Unprocessable(_) => "Unprocessable",
            ApiError::InternalError(_) => "InternalServerError",
        }
    }

    /// Message safe to show a client; internal details stay in the logs
    fn client_message(&self) -> String {
        if let ApiError::InternalError(detail) = self {
            tracing::error!(error = %detail, "request failed");
            "An internal error occurred".to_string()
        } else {
            tracing::debug!(error = %self, "request rejected");
            self.to_string()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind(),
            message: self.client_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::InternalError(format!("{error:#}"))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors.to_string())
    }
}

impl From<AnalysisError> for ApiError {
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::NotFound(_) => ApiError::NotFound(error.to_string()),
            AnalysisError::Configuration { .. } => ApiError::Unprocessable(error.to_string()),
            AnalysisError::Store(_) => ApiError::InternalError(error.to_string()),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(error: IngestError) -> Self {
        match error {
            IngestError::Store(e) => e.into(),
            IngestError::UnknownSystem(_) => ApiError::NotFound(error.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InstallationError;

    #[test]
    fn test_analysis_errors_map_to_status() {
        let not_found: ApiError = AnalysisError::NotFound(7).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "Resource not found: system 7 not found");

        let misconfigured: ApiError = AnalysisError::Configuration {
            system_id: 2,
            source: InstallationError::NoPanels(0),
        }
        .into();
        assert_eq!(misconfigured.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(misconfigured.kind(), "Unprocessable");

        let store: ApiError = AnalysisError::Store("timeout".to_string()).into();
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_ingest_errors_map_to_status() {
        let unknown: ApiError = IngestError::UnknownSystem(4).into();
        assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);

        let store: ApiError = IngestError::Store(anyhow::anyhow!("disk full")).into();
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::InternalError("password=hunter2".to_string());
        assert_eq!(err.client_message(), "An internal error occurred");
        assert_eq!(ApiError::Unauthorized.client_message(), "Unauthorized");
    }
}
