//! Parser traits module
//!
//! Defines the extracted intent and the seam every intent parser implements.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// Task flag value meaning "schedule a meeting".
pub const SCHEDULE_MEETING_TASK: i64 = 1;

/// Structured request extracted from a free-text query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Intent {
    #[serde(alias = "recipient_name", alias = "name")]
    pub recipient: String,
    #[serde(alias = "datetime", alias = "date_and_time", alias = "meeting_time")]
    pub date_time: String,
    /// Raw flag as the model wrote it. Any value is accepted here; only one
    /// that coerces to [`SCHEDULE_MEETING_TASK`] asks for a meeting.
    pub task: Value,
}

impl Intent {
    /// The task flag as an integer, when it can be read as one.
    pub fn task_flag(&self) -> Option<i64> {
        super::utils::task_flag(&self.task)
    }

    pub fn is_schedule_request(&self) -> bool {
        self.task_flag() == Some(SCHEDULE_MEETING_TASK)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("Empty query provided")]
    EmptyQuery,
    #[error("Query too long (max {0} characters)")]
    QueryTooLong(usize),
    #[error("GOOGLE_API_KEY is not set")]
    MissingApiKey,
    #[error("Request to the language model failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Language model API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Language model returned no text")]
    EmptyCompletion,
    #[error("Could not decode intent JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Turns a raw query into an [`Intent`].
#[async_trait]
pub trait IntentParser: Send + Sync {
    async fn parse_intent(&self, query: &str) -> Result<Intent, ParserError>;
}
