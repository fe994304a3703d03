//! Coaching Dialogue Engine — turns one candidate answer into the next
//! interviewer turn.
//!
//! The user turn is appended before the inference call so it stays visible
//! while the call is pending. If the call fails, that turn is removed again
//! and the transcript is exactly what it was before the submission.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::interview::session::{Session, SessionError};
use crate::interview::transcript::{Speaker, Transcript, Turn};
use crate::llm_client::{ChatMessage, ChatRequest, ChatRole, InferenceFailure, InferenceService};

#[derive(Debug, Error)]
pub enum DialogueError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("API quota exceeded. Please try again later or create a new API key.")]
    QuotaExceeded(String),

    #[error("Error: {0}")]
    Service(String),

    #[error("Transcript has no persona turn")]
    MissingPersona,
}

/// Formats the transcript into a chat call: the persona becomes the system
/// instruction, the newest user turn is the new message, and everything in
/// between is history.
pub fn build_chat_request(transcript: &Transcript) -> Option<ChatRequest> {
    let persona = transcript.persona()?;
    let (latest, earlier) = transcript.conversation().split_last()?;
    if latest.speaker != Speaker::User {
        return None;
    }

    let history = earlier
        .iter()
        .filter_map(|turn| {
            let role = match turn.speaker {
                Speaker::Assistant => ChatRole::Model,
                Speaker::User => ChatRole::Human,
                Speaker::System => return None,
            };
            Some(ChatMessage::text(role, turn.content.clone()))
        })
        .collect();

    Some(ChatRequest {
        system_instruction: persona.content.clone(),
        history,
        new_message: latest.content.clone(),
    })
}

/// Submits a candidate answer.
///
/// Returns `Ok(None)` without touching the session when the answer is blank.
/// On success the new assistant turn is returned. On failure the optimistic
/// user turn is rolled back and the error says whether the quota was hit.
pub async fn submit_answer(
    session: &mut Session,
    answer: &str,
    llm: &dyn InferenceService,
) -> Result<Option<Turn>, DialogueError> {
    if answer.trim().is_empty() {
        debug!(session_id = %session.id(), "Ignoring blank answer");
        return Ok(None);
    }

    session.push_user_answer(answer)?;

    let Some(request) = build_chat_request(session.transcript()) else {
        session.rollback_last();
        return Err(DialogueError::MissingPersona);
    };

    match llm.chat(request).await {
        Ok(reply) => {
            let turn = session.record_assistant_reply(reply)?;
            info!(
                session_id = %session.id(),
                turns = session.transcript().len(),
                questions = session.question_count(),
                "Interviewer replied"
            );
            Ok(Some(turn))
        }
        Err(e) => {
            session.rollback_last();
            warn!(session_id = %session.id(), "Dialogue call failed: {e}");
            Err(match e.classify() {
                InferenceFailure::QuotaExceeded => DialogueError::QuotaExceeded(e.to_string()),
                InferenceFailure::Service => DialogueError::Service(e.to_string()),
            })
        }
    }
}
