//! Google Calendar API v3 client.

use super::types::{CreatedEvent, MeetingEvent};
use super::{CalendarConnector, CalendarError, CalendarService};
use crate::auth::Authorizer;
use async_trait::async_trait;
use log::{debug, info};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// Authorized handle to the calendar REST API.
pub struct GoogleCalendar {
    http: reqwest::Client,
    api_base: Url,
    access_token: SecretString,
}

impl GoogleCalendar {
    pub fn new(http: reqwest::Client, api_base: &str, access_token: SecretString) -> Result<Self, CalendarError> {
        let api_base = Url::parse(api_base).map_err(|e| CalendarError::InvalidBaseUrl(format!("{}: {}", api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(CalendarError::InvalidBaseUrl(api_base.to_string()));
        }
        Ok(Self { http, api_base, access_token })
    }

    /// `{base}/calendars/{calendar_id}/events`, with the id percent-encoded.
    fn events_url(&self, calendar_id: &str) -> Result<Url, CalendarError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| CalendarError::InvalidBaseUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(["calendars", calendar_id, "events"]);
        Ok(url)
    }
}

#[async_trait]
impl CalendarService for GoogleCalendar {
    async fn insert_event(&self, calendar_id: &str, event: &MeetingEvent) -> Result<CreatedEvent, CalendarError> {
        let url = self.events_url(calendar_id)?;
        debug!("Inserting event '{}' into calendar {}", event.summary, calendar_id);

        let response = self
            .http
            .post(url)
            .bearer_auth(self.access_token.expose_secret())
            .query(&[("conferenceDataVersion", "1")])
            .json(event)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CalendarError::Api { status: status.as_u16(), message });
        }

        let created: CreatedEvent = response.json().await?;
        info!("Created calendar event {}", created.id);
        Ok(created)
    }
}

/// Runs the authorizer and hands out calendar handles.
pub struct GoogleCalendarConnector {
    authorizer: Authorizer,
    api_base: String,
    http: reqwest::Client,
}

impl GoogleCalendarConnector {
    pub fn new(authorizer: Authorizer, api_base: impl Into<String>) -> Self {
        Self { authorizer, api_base: api_base.into(), http: reqwest::Client::new() }
    }
}

#[async_trait]
impl CalendarConnector for GoogleCalendarConnector {
    async fn connect(&self) -> Result<Box<dyn CalendarService>, CalendarError> {
        let credential = self.authorizer.authorize().await?;
        let calendar = GoogleCalendar::new(
            self.http.clone(),
            &self.api_base,
            SecretString::from(credential.access_token),
        )?;
        Ok(Box::new(calendar))
    }
}
