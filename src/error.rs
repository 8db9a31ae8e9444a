//! Unified error handling for the analysis pipeline and the API layer.
//!
//! `AnalysisError` is the core taxonomy; `ApiError` maps it (plus
//! transport-level conditions) onto consistent HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure classes of the analysis core.
///
/// Callers can distinguish "model reachable but bad output" (`Validation`)
/// from "model unreachable" (`Provider`).
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Missing credential, unknown provider, invalid retrieval parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Document unreadable or carrying too little text to analyze.
    #[error("{0}")]
    Content(String),

    /// Model output failed the response schema.
    #[error("invalid field `{field}`: {message}")]
    Validation { field: String, message: String },

    /// Transport or vendor failure while calling the model.
    #[error("provider error: {0}")]
    Provider(String),
}

impl AnalysisError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Upstream provider failure: {0}")]
    BadGateway(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Configuration(_)
            | AnalysisError::Content(_)
            | AnalysisError::Validation { .. } => Self::BadRequest(err.to_string()),
            AnalysisError::Provider(msg) => Self::BadGateway(msg),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadGateway(_) => "PROVIDER_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg)
            | Self::PayloadTooLarge(msg)
            | Self::Forbidden(msg)
            | Self::BadGateway(msg) => msg.clone(),
            // Don't leak internal error details
            Self::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = ?e, "Internal server error");
            }
            Self::BadGateway(msg) => {
                tracing::error!(error = %msg, "Provider failure");
            }
            _ => {
                tracing::warn!(error = %self, "API error");
            }
        }

        let status = self.status_code();
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_map_to_bad_gateway() {
        let api: ApiError = AnalysisError::Provider("timeout".into()).into();
        assert!(matches!(api, ApiError::BadGateway(_)));
        assert_eq!(api.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn core_errors_map_to_bad_request() {
        for err in [
            AnalysisError::Configuration("GEMINI_API_KEY no configurada".into()),
            AnalysisError::Content("insufficient text".into()),
            AnalysisError::validation("resumen_ejecutivo", "too short"),
        ] {
            let api: ApiError = err.into();
            assert_eq!(api.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn internal_message_is_not_leaked() {
        let api = ApiError::Internal(anyhow::anyhow!("secret detail"));
        assert_eq!(api.public_message(), "An internal error occurred");
    }
}
