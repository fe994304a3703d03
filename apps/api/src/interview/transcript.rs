//! Transcript Store — the ordered, append-only conversation of one session.

use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    System,
    Assistant,
    User,
}

impl Speaker {
    /// Label used when the conversation is rendered for analysis.
    pub fn label(self) -> &'static str {
        match self {
            Speaker::Assistant => "Interviewer",
            Speaker::User | Speaker::System => "Candidate",
        }
    }
}

/// One message in the conversation. Never edited after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub content: String,
}

impl Turn {
    pub fn new(speaker: Speaker, content: impl Into<String>) -> Self {
        Self {
            speaker,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Removes the most recent turn. Only used to roll back an optimistic
    /// append after a failed inference call.
    pub(crate) fn pop_last(&mut self) -> Option<Turn> {
        self.turns.pop()
    }

    pub(crate) fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// The system persona turn, if the transcript starts with one.
    pub fn persona(&self) -> Option<&Turn> {
        self.turns.first().filter(|t| t.speaker == Speaker::System)
    }

    /// Every turn after the persona, in chronological order.
    pub fn conversation(&self) -> &[Turn] {
        match self.persona() {
            Some(_) => &self.turns[1..],
            None => &self.turns,
        }
    }
}
