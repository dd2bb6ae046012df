mod common;

use common::*;
use meetbot::contacts::ContactBook;
use meetbot::QueryOutcome;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use test_case::test_case;

#[tokio::test]
async fn schedules_meeting_for_known_contact() {
    let (_dir, contacts) = contact_table("Alice,alice@x.com\nBob,bob@x.com\n");
    let calendar = RecordingCalendar::default();
    let processor = processor(CannedParser::replying(intent("Bob", "tomorrow at 10am", 1)), contacts, &calendar);

    let outcome = processor.process("Schedule a meeting with Bob tomorrow at 10am").await.unwrap();

    assert_eq!(outcome, QueryOutcome::Scheduled { link: "https://calendar.test/event?eid=evt1".to_string() });
    let events = calendar.events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.summary, "Meeting with Bob");
    assert_eq!(event.start.date_time, "2026-10-20T10:00:00");
    assert_eq!(event.end.date_time, "2026-10-20T11:00:00");
    assert_eq!(event.start.time_zone, "UTC");
    assert_eq!(event.attendees.len(), 1);
    assert_eq!(event.attendees[0].email, "bob@x.com");
    assert_eq!(event.conference_data.create_request.request_id, "sample123");
}

#[test_case(json!(0) ; "zero")]
#[test_case(json!(2) ; "other positive")]
#[test_case(json!(-1) ; "negative")]
#[test_case(json!(1.5) ; "fractional")]
#[test_case(json!("yes") ; "word")]
#[test_case(json!("schedule") ; "task name")]
#[test_case(Value::Null ; "null")]
#[tokio::test]
async fn unsupported_task_creates_nothing(task: Value) {
    let (_dir, contacts) = contact_table("Carol,carol@x.com\n");
    let calendar = RecordingCalendar::default();
    let processor = processor(CannedParser::replying(intent("Carol", "tomorrow at 10am", task)), contacts, &calendar);

    let outcome = processor.process("What's the weather like?").await.unwrap();

    assert_eq!(outcome, QueryOutcome::UnsupportedTask);
    assert_eq!(outcome.to_string(), "Error: Unsupported task.");
    assert!(calendar.events().is_empty());
    assert_eq!(calendar.connects(), 0);
}

#[tokio::test]
async fn unknown_recipient_creates_nothing() {
    let (_dir, contacts) = contact_table("Alice,alice@x.com\n");
    let calendar = RecordingCalendar::default();
    let processor = processor(CannedParser::replying(intent("Dave", "tomorrow at 10am", 1)), contacts, &calendar);

    let outcome = processor.process("Set up a call with Dave tomorrow at 10am").await.unwrap();

    assert_eq!(outcome, QueryOutcome::EmailNotFound);
    assert_eq!(outcome.to_string(), "Error: Email not found.");
    assert!(calendar.events().is_empty());
}

#[test_case("blergh" ; "nonsense")]
#[test_case("sometime soon" ; "vague")]
#[test_case("" ; "empty")]
#[tokio::test]
async fn unparseable_date_creates_nothing(date_time: &str) {
    let (_dir, contacts) = contact_table("Bob,bob@x.com\n");
    let calendar = RecordingCalendar::default();
    let processor = processor(CannedParser::replying(intent("Bob", date_time, 1)), contacts, &calendar);

    let outcome = processor.process("Meet Bob").await.unwrap();

    assert_eq!(outcome, QueryOutcome::UnparseableDateTime(date_time.to_string()));
    assert!(calendar.events().is_empty());
    assert_eq!(calendar.connects(), 0);
}

#[tokio::test]
async fn extraction_failure_creates_nothing() {
    let (_dir, contacts) = contact_table("Bob,bob@x.com\n");
    let calendar = RecordingCalendar::default();
    let parser = CannedParser::failing();
    let calls = parser.calls.clone();
    let processor = processor(parser, contacts, &calendar);

    let outcome = processor.process("Meet Bob tomorrow").await.unwrap();

    assert_eq!(outcome, QueryOutcome::NoIntent);
    assert_eq!(outcome.to_string(), "Error: Could not extract task from the prompt.");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(calendar.events().is_empty());
}

#[tokio::test]
async fn same_query_twice_creates_two_events() {
    let (_dir, contacts) = contact_table("Bob,bob@x.com\n");
    let calendar = RecordingCalendar::default();
    let processor = processor(CannedParser::replying(intent("Bob", "friday at 3pm", 1)), contacts, &calendar);

    let first = processor.process("Meet Bob friday at 3pm").await.unwrap();
    let second = processor.process("Meet Bob friday at 3pm").await.unwrap();

    assert_ne!(first, second);
    let events = calendar.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], events[1]);
    assert_eq!(events[0].start.date_time, "2026-10-23T15:00:00");
}

#[tokio::test]
async fn missing_contact_table_is_an_error() {
    let calendar = RecordingCalendar::default();
    let contacts = ContactBook::new("/definitely/not/here/contacts.csv");
    let processor = processor(CannedParser::replying(intent("Bob", "tomorrow", 1)), contacts, &calendar);

    assert!(processor.process("Meet Bob tomorrow").await.is_err());
    assert!(calendar.events().is_empty());
}
