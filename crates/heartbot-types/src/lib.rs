use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single curated or learned question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

impl FaqEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Who produced a line of the chat transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    #[serde(rename = "You")]
    User,
    #[serde(rename = "HeartBot")]
    Bot,
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Speaker::User => write!(f, "You"),
            Speaker::Bot => write!(f, "HeartBot"),
        }
    }
}

/// One line of the chat transcript.
///
/// Serialized as a `[speaker, text]` pair so persisted transcripts stay a
/// plain list of tuples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Speaker, String)", into = "(Speaker, String)")]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Bot,
            text: text.into(),
        }
    }
}

impl From<(Speaker, String)> for ConversationTurn {
    fn from((speaker, text): (Speaker, String)) -> Self {
        Self { speaker, text }
    }
}

impl From<ConversationTurn> for (Speaker, String) {
    fn from(turn: ConversationTurn) -> Self {
        (turn.speaker, turn.text)
    }
}

/// Resting heart-rate classification of an average BPM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BpmStatus {
    Low,
    Normal,
    High,
}

impl BpmStatus {
    /// Lower bound (inclusive) of the normal resting range.
    pub const LOW_LIMIT: f64 = 60.0;
    /// Upper bound (inclusive) of the normal resting range.
    pub const HIGH_LIMIT: f64 = 100.0;

    /// Classify a mean BPM: below 60 is low, above 100 is high.
    pub fn classify(mean_bpm: f64) -> Self {
        if mean_bpm < Self::LOW_LIMIT {
            BpmStatus::Low
        } else if mean_bpm > Self::HIGH_LIMIT {
            BpmStatus::High
        } else {
            BpmStatus::Normal
        }
    }
}

impl std::fmt::Display for BpmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BpmStatus::Low => write!(f, "Low"),
            BpmStatus::Normal => write!(f, "Normal"),
            BpmStatus::High => write!(f, "High"),
        }
    }
}

/// Per-user document storage for chat transcripts and BPM histories.
///
/// Every save replaces the whole document for that user. Loads return an
/// empty document when nothing is stored or the stored payload cannot be
/// decoded; only failures of the storage backend itself surface as errors.
pub trait HistoryStore: Send + Sync {
    fn load_transcript(&self, username: &str) -> Result<Vec<ConversationTurn>, HeartbotError>;

    fn save_transcript(
        &self,
        username: &str,
        transcript: &[ConversationTurn],
    ) -> Result<(), HeartbotError>;

    fn load_readings(&self, username: &str) -> Result<Vec<f64>, HeartbotError>;

    fn save_readings(&self, username: &str, readings: &[f64]) -> Result<(), HeartbotError>;
}

/// Errors shared across the HeartBot crates.
#[derive(Error, Debug)]
pub enum HeartbotError {
    #[error("Sensor Fault on {device}: {details}")]
    Sensor { device: String, details: String },

    #[error("Persistence Error: {0}")]
    Persistence(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Invalid Session: {0}")]
    InvalidSession(String),
}
