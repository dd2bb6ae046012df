//! Google Calendar event payloads.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Every meeting is booked for exactly one hour.
pub const MEETING_DURATION_MINUTES: i64 = 60;

const EVENT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const EVENT_TIME_ZONE: &str = "UTC";

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingEvent {
    pub summary: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub attendees: Vec<Attendee>,
    pub conference_data: ConferenceData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceData {
    pub create_request: CreateConferenceRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConferenceRequest {
    pub request_id: String,
}

impl EventDateTime {
    fn utc(at: DateTime<Utc>) -> Self {
        Self {
            date_time: at.format(EVENT_TIME_FORMAT).to_string(),
            time_zone: EVENT_TIME_ZONE.to_string(),
        }
    }
}

impl MeetingEvent {
    /// One-hour meeting with a single attendee and a conferencing request.
    ///
    /// `None` when the end would fall outside the representable range.
    pub fn new(name: &str, email: &str, start: DateTime<Utc>, request_id: String) -> Option<Self> {
        let end = start.checked_add_signed(Duration::minutes(MEETING_DURATION_MINUTES))?;
        Some(Self {
            summary: format!("Meeting with {}", name),
            start: EventDateTime::utc(start),
            end: EventDateTime::utc(end),
            attendees: vec![Attendee { email: email.to_string() }],
            conference_data: ConferenceData {
                create_request: CreateConferenceRequest { request_id },
            },
        })
    }
}

/// How conferencing request ids are chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConferenceRequestId {
    /// The same id on every event.
    Fixed(String),
    /// A fresh UUID v4 per event.
    Unique,
}

impl ConferenceRequestId {
    pub fn next_id(&self) -> String {
        match self {
            Self::Fixed(id) => id.clone(),
            Self::Unique => uuid::Uuid::new_v4().to_string(),
        }
    }
}

// ============================================================================
// Response types
// ============================================================================

/// The subset of the inserted event we care about.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    #[serde(default)]
    pub id: String,
    pub html_link: Option<String>,
}
