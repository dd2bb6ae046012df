use crate::calendar::{MeetingScheduler, ScheduleOutcome};
use crate::contacts::ContactBook;
use crate::parser::{Intent, IntentParser};
use anyhow::Result;
use log::{debug, error, info};
use std::fmt;

/// Normalize console input for keyword comparisons.
pub fn preprocess_input(input: &str) -> String {
    input.trim().to_lowercase()
}

/// How a single query ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Scheduled { link: String },
    NoIntent,
    UnsupportedTask,
    EmailNotFound,
    UnparseableDateTime(String),
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled { link } => write!(f, "Meeting scheduled successfully: {}", link),
            Self::NoIntent => write!(f, "Error: Could not extract task from the prompt."),
            Self::UnsupportedTask => write!(f, "Error: Unsupported task."),
            Self::EmailNotFound => write!(f, "Error: Email not found."),
            Self::UnparseableDateTime(text) => {
                write!(f, "Error: Unable to parse the date and time from the string: '{}'", text)
            }
        }
    }
}

impl From<ScheduleOutcome> for QueryOutcome {
    fn from(outcome: ScheduleOutcome) -> Self {
        match outcome {
            ScheduleOutcome::Scheduled { link } => Self::Scheduled { link },
            ScheduleOutcome::UnparseableDateTime(text) => Self::UnparseableDateTime(text),
        }
    }
}

/// Runs one query through extraction, validation, lookup and scheduling.
pub struct QueryProcessor {
    parser: Box<dyn IntentParser>,
    contacts: ContactBook,
    scheduler: MeetingScheduler,
}

impl QueryProcessor {
    pub fn new(parser: Box<dyn IntentParser>, contacts: ContactBook, scheduler: MeetingScheduler) -> Self {
        Self { parser, contacts, scheduler }
    }

    /// Extraction failures are logged and reported as no intent.
    pub async fn analyze(&self, query: &str) -> Option<Intent> {
        match self.parser.parse_intent(query).await {
            Ok(intent) => {
                debug!("Extracted intent: {:?}", intent);
                Some(intent)
            }
            Err(e) => {
                error!("Failed to extract intent: {}", e);
                None
            }
        }
    }

    /// Stops at the first failing step and prints how the query ended.
    ///
    /// Contact table, authorization and calendar failures are returned as errors.
    pub async fn process(&self, query: &str) -> Result<QueryOutcome> {
        let outcome = self.run(query).await?;
        println!("{}", outcome);
        Ok(outcome)
    }

    async fn run(&self, query: &str) -> Result<QueryOutcome> {
        let Some(intent) = self.analyze(query).await else {
            return Ok(QueryOutcome::NoIntent);
        };
        if !intent.is_schedule_request() {
            info!("Unsupported task flag {}", intent.task);
            return Ok(QueryOutcome::UnsupportedTask);
        }

        let Some(email) = self.contacts.lookup(&intent.recipient)? else {
            return Ok(QueryOutcome::EmailNotFound);
        };

        let outcome = self.scheduler.schedule(&intent.recipient, &email, &intent.date_time).await?;
        Ok(outcome.into())
    }
}
