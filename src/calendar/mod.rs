//! Meeting scheduling on Google Calendar.

pub mod google;
pub mod types;

use crate::auth::{AuthError, Authorizer};
use crate::clock::Clock;
use crate::config::Config;
use crate::time_parser::DateTimeNormalizer;
use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

pub use google::{GoogleCalendar, GoogleCalendarConnector};
pub use types::{ConferenceRequestId, CreatedEvent, MeetingEvent, MEETING_DURATION_MINUTES};

/// Custom error type for calendar operations
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("Calendar authorization failed: {0}")]
    Auth(#[from] AuthError),
    #[error("Calendar request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Calendar API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Created event has no confirmation link")]
    MissingLink,
    #[error("Invalid calendar API base URL: {0}")]
    InvalidBaseUrl(String),
}

/// An authorized calendar.
#[async_trait]
pub trait CalendarService: Send + Sync {
    async fn insert_event(&self, calendar_id: &str, event: &MeetingEvent) -> Result<CreatedEvent, CalendarError>;
}

/// Produces authorized calendar handles, authorizing on demand.
#[async_trait]
pub trait CalendarConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn CalendarService>, CalendarError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled { link: String },
    UnparseableDateTime(String),
}

pub struct MeetingScheduler {
    connector: Box<dyn CalendarConnector>,
    normalizer: DateTimeNormalizer,
    calendar_id: String,
    request_ids: ConferenceRequestId,
}

impl MeetingScheduler {
    pub fn new(
        connector: Box<dyn CalendarConnector>,
        normalizer: DateTimeNormalizer,
        calendar_id: impl Into<String>,
        request_ids: ConferenceRequestId,
    ) -> Self {
        Self { connector, normalizer, calendar_id: calendar_id.into(), request_ids }
    }

    /// Google Calendar backed scheduler.
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Result<Self, CalendarError> {
        let google = &config.google;
        let authorizer = Authorizer::from_config(google, clock.clone())?;
        let connector = GoogleCalendarConnector::new(authorizer, &google.calendar_api_base);
        let request_ids = if google.unique_conference_ids {
            ConferenceRequestId::Unique
        } else {
            ConferenceRequestId::Fixed(google.conference_request_id.clone())
        };
        Ok(Self::new(Box::new(connector), DateTimeNormalizer::new(clock), &google.calendar_id, request_ids))
    }

    /// Book a one-hour meeting with `email` at the time described by `date_time`.
    ///
    /// The time is parsed before any authorization happens, so an unparseable
    /// string never triggers consent or touches the calendar.
    pub async fn schedule(&self, name: &str, email: &str, date_time: &str) -> Result<ScheduleOutcome, CalendarError> {
        let Some(start) = self.normalizer.parse(date_time) else {
            info!("Could not parse '{}' as a date and time", date_time);
            return Ok(ScheduleOutcome::UnparseableDateTime(date_time.to_string()));
        };
        debug!("Resolved '{}' to {}", date_time, start);

        let Some(event) = MeetingEvent::new(name, email, start, self.request_ids.next_id()) else {
            info!("'{}' leaves no room for a one-hour meeting", date_time);
            return Ok(ScheduleOutcome::UnparseableDateTime(date_time.to_string()));
        };

        let calendar = self.connector.connect().await?;
        let created = calendar.insert_event(&self.calendar_id, &event).await?;

        let link = created.html_link.ok_or(CalendarError::MissingLink)?;
        info!("Scheduled '{}' at {}", event.summary, event.start.date_time);
        Ok(ScheduleOutcome::Scheduled { link })
    }
}
