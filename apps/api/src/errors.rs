use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::interview::dialogue::DialogueError;
use crate::interview::feedback::FeedbackError;
use crate::interview::session::SessionError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("API key required")]
    MissingApiKey,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Validation(msg) => AppError::Validation(msg),
            invalid @ SessionError::InvalidPhase { .. } => AppError::Conflict(invalid.to_string()),
        }
    }
}

impl From<DialogueError> for AppError {
    fn from(e: DialogueError) -> Self {
        match e {
            DialogueError::Session(e) => e.into(),
            DialogueError::QuotaExceeded(msg) => AppError::QuotaExceeded(msg),
            DialogueError::Service(msg) => AppError::Llm(msg),
            missing @ DialogueError::MissingPersona => AppError::Internal(anyhow::Error::new(missing)),
        }
    }
}

impl From<FeedbackError> for AppError {
    fn from(e: FeedbackError) -> Self {
        match e {
            FeedbackError::Session(e) => e.into(),
            FeedbackError::Service(msg) => AppError::Llm(msg),
            missing @ FeedbackError::NotGenerated => AppError::Conflict(missing.to_string()),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::MissingApiKey => AppError::MissingApiKey,
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::MissingApiKey => (
                StatusCode::BAD_REQUEST,
                "MISSING_API_KEY",
                "A Gemini API key is required before an interview can start".to_string(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::QuotaExceeded(msg) => {
                tracing::warn!("Quota exceeded: {msg}");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "QUOTA_EXCEEDED",
                    "API quota exceeded. Please try again later or create a new API key."
                        .to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (StatusCode::BAD_GATEWAY, "LLM_ERROR", format!("Error: {msg}"))
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::session::Phase;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::MissingApiKey, StatusCode::BAD_REQUEST),
            (AppError::QuotaExceeded("q".into()), StatusCode::TOO_MANY_REQUESTS),
            (AppError::Llm("boom".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_wrong_phase_maps_to_conflict() {
        let err: AppError = SessionError::InvalidPhase {
            expected: Phase::Active,
            actual: Phase::Ended,
        }
        .into();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_dialogue_quota_maps_to_quota() {
        let err: AppError = DialogueError::QuotaExceeded("429".into()).into();
        assert!(matches!(err, AppError::QuotaExceeded(_)));
    }
}
