//! Axum route handlers for the Interview API.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::catalog::{catalog, Catalog};
use crate::interview::dialogue::submit_answer;
use crate::interview::feedback::{
    export_file_name, generate_feedback, ExportRecord, FeedbackError, FeedbackReport,
};
use crate::interview::session::{Phase, Selection, Session};
use crate::interview::store::{SessionEntry, SessionHandle};
use crate::interview::transcript::Turn;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

/// What the front-end renders. The persona turn is never exposed.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub phase: Phase,
    pub question_count: u32,
    pub elapsed_minutes: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub selection: Option<Selection>,
    pub conversation: Vec<Turn>,
    pub has_feedback: bool,
}

impl SessionView {
    fn of(session: &Session, now: DateTime<Utc>) -> Self {
        Self {
            id: session.id(),
            phase: session.phase(),
            question_count: session.question_count(),
            elapsed_minutes: session.elapsed_minutes(now),
            started_at: session.started_at(),
            selection: session.selection().cloned(),
            conversation: session.transcript().conversation().to_vec(),
            has_feedback: session.feedback().is_some(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    /// False when the answer was blank and nothing happened.
    pub accepted: bool,
    pub reply: Option<Turn>,
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub feedback: FeedbackReport,
    pub export_file_name: String,
    pub session: SessionView,
}

/// An empty body means "use the server's key"; anything else must be a valid
/// request object.
fn parse_create_request(body: &[u8]) -> Result<CreateSessionRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CreateSessionRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("invalid session request: {e}")))
}

async fn find(state: &AppState, id: Uuid) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/catalog
pub async fn handle_catalog() -> Json<Catalog> {
    Json(catalog())
}

/// POST /api/v1/sessions
///
/// Creates a Setup session bound to the caller's API key, or the server's
/// default key when none is given. Without any key nothing can proceed.
pub async fn handle_create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let request = parse_create_request(&body)?;
    let api_key = state
        .config
        .resolve_api_key(request.api_key.as_deref())
        .ok_or(AppError::MissingApiKey)?;

    let llm = state.connector.connect(&api_key)?;
    let id = state.sessions.create(llm).await;
    info!(session_id = %id, "Session created");

    let handle = find(&state, id).await?;
    let view = SessionView::of(&handle.lock().await.session, Utc::now());
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find(&state, id).await?;
    let view = SessionView::of(&handle.lock().await.session, Utc::now());
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/start
pub async fn handle_start(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(selection): Json<Selection>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find(&state, id).await?;
    let mut entry = handle.lock().await;
    let now = Utc::now();
    entry.session.start(selection, now)?;
    let view = SessionView::of(&entry.session, now);
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/answers
///
/// Blank answers are accepted as a no-op. The session lock is held across the
/// inference call, so answers to one session are processed one at a time.
pub async fn handle_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let handle = find(&state, id).await?;
    let mut guard = handle.lock().await;
    let SessionEntry { session, llm } = &mut *guard;

    let reply = submit_answer(session, &request.answer, llm.as_ref()).await?;
    Ok(Json(AnswerResponse {
        accepted: reply.is_some(),
        reply,
        session: SessionView::of(session, Utc::now()),
    }))
}

/// POST /api/v1/sessions/:id/end
///
/// Ends the interview and produces the feedback report.
pub async fn handle_end(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let handle = find(&state, id).await?;
    let mut guard = handle.lock().await;
    guard.session.end()?;
    let response = feedback_for(&mut guard).await?;
    Ok(response)
}

/// GET /api/v1/sessions/:id/feedback
///
/// Returns the cached report, generating it only if no earlier attempt succeeded.
pub async fn handle_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let handle = find(&state, id).await?;
    let mut guard = handle.lock().await;
    let response = feedback_for(&mut guard).await?;
    Ok(response)
}

async fn feedback_for(entry: &mut SessionEntry) -> Result<Json<FeedbackResponse>, AppError> {
    let SessionEntry { session, llm } = entry;
    let now = Utc::now();
    let feedback = generate_feedback(session, llm.as_ref(), now).await?;
    Ok(Json(FeedbackResponse {
        export_file_name: export_file_name(feedback.generated_at),
        feedback,
        session: SessionView::of(session, now),
    }))
}

/// GET /api/v1/sessions/:id/export
///
/// Serves the interview report as a JSON attachment. Only available once
/// feedback has been generated.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = find(&state, id).await?;
    let entry = handle.lock().await;

    let record = ExportRecord::from_session(&entry.session)?;
    let generated_at = entry
        .session
        .feedback()
        .map(|f| f.generated_at)
        .ok_or(FeedbackError::NotGenerated)?;
    let body = record
        .to_json()
        .map_err(|e| AppError::Internal(e.into()))?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(generated_at)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// POST /api/v1/sessions/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find(&state, id).await?;
    let mut entry = handle.lock().await;
    entry.session.reset();
    let view = SessionView::of(&entry.session, Utc::now());
    Ok(Json(view))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        info!(session_id = %id, "Session deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_create_body_uses_defaults() {
        let bodies: [&[u8]; 2] = [b"", b"  \n"];
        for body in bodies {
            let request = parse_create_request(body).unwrap();
            assert!(request.api_key.is_none());
        }
    }

    #[test]
    fn test_create_body_with_key() {
        let request = parse_create_request(br#"{"api_key": "abc"}"#).unwrap();
        assert_eq!(request.api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_malformed_create_body_is_validation_error() {
        let bodies: [&[u8]; 2] = [br#"{"api_key": 5}"#, b"not json"];
        for body in bodies {
            assert!(matches!(
                parse_create_request(body),
                Err(AppError::Validation(_))
            ));
        }
    }
}
