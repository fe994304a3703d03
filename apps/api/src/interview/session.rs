//! Session State Machine.
//!
//! Lifecycle: `Setup → Active → Ended`, with `reset` returning to `Setup` from
//! any phase. Every mutation of a session goes through the methods here; the
//! dialogue and feedback engines call them rather than touching fields.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::interview::feedback::FeedbackReport;
use crate::interview::prompts::{GREETING_TEMPLATE, PERSONA};
use crate::interview::transcript::{Speaker, Transcript, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Active,
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::Active => "active",
            Phase::Ended => "ended",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid selection: {0}")]
    Validation(String),

    #[error("Session is {actual}, expected {expected}")]
    InvalidPhase { expected: Phase, actual: Phase },
}

/// What the candidate picked during Setup. Captured once at start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub role: String,
    pub experience_level: String,
    #[serde(default)]
    pub focus_areas: Vec<String>,
}

impl Selection {
    fn validated(self) -> Result<Self, SessionError> {
        let role = self.role.trim().to_string();
        let experience_level = self.experience_level.trim().to_string();
        if role.is_empty() {
            return Err(SessionError::Validation("role cannot be empty".to_string()));
        }
        if experience_level.is_empty() {
            return Err(SessionError::Validation(
                "experience_level cannot be empty".to_string(),
            ));
        }
        let focus_areas = self
            .focus_areas
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        Ok(Self {
            role,
            experience_level,
            focus_areas,
        })
    }

    /// Either empty or `"\nFocus on: a, b"`.
    fn focus_line(&self) -> String {
        if self.focus_areas.is_empty() {
            String::new()
        } else {
            format!("\nFocus on: {}", self.focus_areas.join(", "))
        }
    }

    pub fn persona(&self) -> String {
        format!(
            "{PERSONA}\n\nRole: {}\nExperience: {}{}",
            self.role,
            self.experience_level,
            self.focus_line()
        )
    }

    pub fn greeting(&self) -> String {
        GREETING_TEMPLATE
            .replace("{role}", &self.role)
            .replace("{experience}", &self.experience_level)
            .replace("{focus}", &self.focus_line())
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    phase: Phase,
    transcript: Transcript,
    question_count: u32,
    started_at: Option<DateTime<Utc>>,
    selection: Option<Selection>,
    feedback: Option<FeedbackReport>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            phase: Phase::Setup,
            transcript: Transcript::new(),
            question_count: 0,
            started_at: None,
            selection: None,
            feedback: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn feedback(&self) -> Option<&FeedbackReport> {
        self.feedback.as_ref()
    }

    pub fn ensure_phase(&self, expected: Phase) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Whole minutes since the interview started. Zero before start.
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> u64 {
        self.started_at
            .map(|start| (now - start).num_minutes().max(0) as u64)
            .unwrap_or(0)
    }

    /// Setup → Active. Seeds the persona and the opening question.
    pub fn start(&mut self, selection: Selection, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.ensure_phase(Phase::Setup)?;
        debug_assert!(self.transcript.is_empty(), "Setup sessions have no turns");
        let selection = selection.validated()?;

        self.transcript
            .push(Turn::new(Speaker::System, selection.persona()));
        self.transcript
            .push(Turn::new(Speaker::Assistant, selection.greeting()));
        self.started_at = Some(now);
        self.question_count = 1;

        info!(
            session_id = %self.id,
            role = %selection.role,
            experience = %selection.experience_level,
            focus_areas = selection.focus_areas.len(),
            "Interview started"
        );

        self.selection = Some(selection);
        self.phase = Phase::Active;
        Ok(())
    }

    /// Active → Ended, regardless of how many exchanges happened.
    pub fn end(&mut self) -> Result<(), SessionError> {
        self.ensure_phase(Phase::Active)?;
        self.phase = Phase::Ended;
        info!(
            session_id = %self.id,
            turns = self.transcript.len(),
            questions = self.question_count,
            "Interview ended"
        );
        Ok(())
    }

    /// Discards everything but the id and returns to Setup.
    pub fn reset(&mut self) {
        info!(session_id = %self.id, from = %self.phase, "Interview reset");
        self.phase = Phase::Setup;
        self.transcript.clear();
        self.question_count = 0;
        self.started_at = None;
        self.selection = None;
        self.feedback = None;
    }

    pub(crate) fn push_user_answer(&mut self, answer: &str) -> Result<(), SessionError> {
        self.ensure_phase(Phase::Active)?;
        self.transcript.push(Turn::new(Speaker::User, answer));
        Ok(())
    }

    pub(crate) fn rollback_last(&mut self) -> Option<Turn> {
        self.transcript.pop_last()
    }

    /// Appends the model's reply and counts it as a question when it contains
    /// a literal `?`.
    pub(crate) fn record_assistant_reply(&mut self, reply: String) -> Result<Turn, SessionError> {
        self.ensure_phase(Phase::Active)?;
        if reply.contains('?') {
            self.question_count += 1;
        }
        let turn = Turn::new(Speaker::Assistant, reply);
        self.transcript.push(turn.clone());
        Ok(turn)
    }

    pub(crate) fn cache_feedback(&mut self, report: FeedbackReport) -> Result<(), SessionError> {
        self.ensure_phase(Phase::Ended)?;
        self.feedback = Some(report);
        Ok(())
    }
}
