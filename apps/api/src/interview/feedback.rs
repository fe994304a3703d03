//! Feedback Generator — one-shot analysis of a finished interview, plus the
//! downloadable transcript record.
//!
//! The report text is opaque: scores and sections are whatever the model
//! wrote, and nothing here parses them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::interview::prompts::{FEEDBACK_PROMPT, TRANSCRIPT_HEADER};
use crate::interview::session::{Phase, Session, SessionError};
use crate::interview::transcript::{Speaker, Transcript, Turn};
use crate::llm_client::InferenceService;

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Error generating feedback: {0}")]
    Service(String),

    #[error("Feedback has not been generated for this session")]
    NotGenerated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub text: String,
    pub generated_at: DateTime<Utc>,
}

/// Renders the conversation (persona excluded) as labelled paragraphs.
pub fn format_conversation(transcript: &Transcript) -> String {
    transcript
        .conversation()
        .iter()
        .map(|turn| format!("{}: {}", turn.speaker.label(), turn.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_feedback_prompt(conversation: &str) -> String {
    format!("{FEEDBACK_PROMPT}\n\n{TRANSCRIPT_HEADER}\n{conversation}")
}

/// Produces the feedback report for an ended session.
///
/// The first successful report is cached on the session; later calls return it
/// without contacting the service. Failures are not cached, so the candidate
/// can ask again.
pub async fn generate_feedback(
    session: &mut Session,
    llm: &dyn InferenceService,
    now: DateTime<Utc>,
) -> Result<FeedbackReport, FeedbackError> {
    session.ensure_phase(Phase::Ended)?;
    if let Some(report) = session.feedback() {
        return Ok(report.clone());
    }

    let prompt = build_feedback_prompt(&format_conversation(session.transcript()));
    let text = llm.generate(&prompt).await.map_err(|e| {
        warn!(session_id = %session.id(), "Feedback call failed: {e}");
        FeedbackError::Service(e.to_string())
    })?;

    let report = FeedbackReport {
        text,
        generated_at: now,
    };
    session.cache_feedback(report.clone())?;
    info!(session_id = %session.id(), "Feedback generated");
    Ok(report)
}

/// One exported turn. `speaker` keeps the transcript role name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTurn {
    pub speaker: Speaker,
    pub content: String,
}

impl From<&Turn> for ExportTurn {
    fn from(turn: &Turn) -> Self {
        Self {
            speaker: turn.speaker,
            content: turn.content.clone(),
        }
    }
}

/// The downloadable interview report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub role: String,
    pub experience: String,
    pub date: String,
    pub duration_minutes: u64,
    pub conversation: Vec<ExportTurn>,
    pub feedback: String,
}

impl ExportRecord {
    /// Builds the record from an ended session with a cached report. Date and
    /// duration are taken at the moment the report was generated, so repeated
    /// downloads are identical.
    pub fn from_session(session: &Session) -> Result<Self, FeedbackError> {
        session.ensure_phase(Phase::Ended)?;
        let report = session.feedback().ok_or(FeedbackError::NotGenerated)?;
        let selection = session.selection().ok_or(FeedbackError::NotGenerated)?;

        Ok(Self {
            role: selection.role.clone(),
            experience: selection.experience_level.clone(),
            date: report.generated_at.format("%Y-%m-%d %H:%M").to_string(),
            duration_minutes: session.elapsed_minutes(report.generated_at),
            conversation: session
                .transcript()
                .conversation()
                .iter()
                .map(ExportTurn::from)
                .collect(),
            feedback: report.text.clone(),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub fn export_file_name(generated_at: DateTime<Utc>) -> String {
    format!(
        "interview_report_{}.json",
        generated_at.format("%Y%m%d_%H%M")
    )
}
