#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use meetbot::app::Console;
use meetbot::calendar::{
    CalendarConnector, CalendarError, CalendarService, ConferenceRequestId, CreatedEvent, MeetingEvent,
    MeetingScheduler,
};
use meetbot::clock::FixedClock;
use meetbot::command_processor::QueryProcessor;
use meetbot::contacts::ContactBook;
use meetbot::parser::{Intent, IntentParser, ParserError};
use meetbot::time_parser::DateTimeNormalizer;
use std::collections::VecDeque;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Monday 2026-10-19 08:30 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap()
}

pub fn intent(recipient: &str, date_time: &str, task: impl Into<serde_json::Value>) -> Intent {
    Intent { recipient: recipient.to_string(), date_time: date_time.to_string(), task: task.into() }
}

/// Answers every query with the same model reply, counting calls.
pub struct CannedParser {
    reply: Option<Intent>,
    pub calls: Arc<AtomicUsize>,
}

impl CannedParser {
    pub fn replying(intent: Intent) -> Self {
        Self { reply: Some(intent), calls: Arc::default() }
    }

    /// Behaves like a model whose reply could not be decoded.
    pub fn failing() -> Self {
        Self { reply: None, calls: Arc::default() }
    }
}

#[async_trait]
impl IntentParser for CannedParser {
    async fn parse_intent(&self, _query: &str) -> Result<Intent, ParserError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(intent) => Ok(intent.clone()),
            None => Err(ParserError::EmptyCompletion),
        }
    }
}

/// Calendar double that records every inserted event.
#[derive(Clone, Default)]
pub struct RecordingCalendar {
    pub events: Arc<Mutex<Vec<MeetingEvent>>>,
    pub connects: Arc<AtomicUsize>,
}

impl RecordingCalendar {
    pub fn events(&self) -> Vec<MeetingEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarService for RecordingCalendar {
    async fn insert_event(&self, _calendar_id: &str, event: &MeetingEvent) -> Result<CreatedEvent, CalendarError> {
        let mut events = self.events.lock().unwrap();
        events.push(event.clone());
        let id = format!("evt{}", events.len());
        Ok(CreatedEvent { html_link: Some(format!("https://calendar.test/event?eid={}", id)), id })
    }
}

#[async_trait]
impl CalendarConnector for RecordingCalendar {
    async fn connect(&self) -> Result<Box<dyn CalendarService>, CalendarError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.clone()))
    }
}

pub fn contact_table(rows: &str) -> (TempDir, ContactBook) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.csv");
    fs::write(&path, format!("Name,Email\n{}", rows)).unwrap();
    (dir, ContactBook::new(path))
}

pub fn processor(parser: CannedParser, contacts: ContactBook, calendar: &RecordingCalendar) -> QueryProcessor {
    let scheduler = MeetingScheduler::new(
        Box::new(calendar.clone()),
        DateTimeNormalizer::new(Arc::new(FixedClock(now()))),
        "primary",
        ConferenceRequestId::Fixed("sample123".to_string()),
    );
    QueryProcessor::new(Box::new(parser), contacts, scheduler)
}

/// Console fed from a fixed list of lines; records the prompts shown.
pub struct ScriptedConsole {
    lines: VecDeque<String>,
    pub prompts: Vec<String>,
}

impl ScriptedConsole {
    pub fn new(lines: &[&str]) -> Self {
        Self { lines: lines.iter().map(|l| l.to_string()).collect(), prompts: Vec::new() }
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.lines.pop_front())
    }
}
