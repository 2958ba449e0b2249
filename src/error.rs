use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing required input. No provider was contacted.
    #[error("{0}")]
    Validation(String),

    /// A mandatory provider credential is missing.
    #[error("{0}")]
    Configuration(String),

    /// An external provider failed, timed out or sent something unreadable.
    #[error("{0}")]
    Provider(String),

    #[error("{0}")]
    Unexpected(String),

    /// The request body could not be read as JSON; keeps the extractor's status.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected { status, .. } => *status,
            AppError::Configuration(_) | AppError::Provider(_) | AppError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Provider(format!("Provider request timed out: {e}"))
        } else if e.is_decode() {
            AppError::Provider(format!("Failed to parse provider response: {e}"))
        } else {
            AppError::Provider(format!("Provider request failed: {e}"))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[test]
fn test_status_classification() {
    assert_eq!(
        AppError::Validation("x".into()).status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        AppError::Configuration("x".into()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        AppError::Provider("x".into()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        AppError::Unexpected("x".into()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        AppError::Rejected {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "x".into()
        }
        .status_code(),
        StatusCode::PAYLOAD_TOO_LARGE
    );
}
