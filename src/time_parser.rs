//! Free-form date/time normalization.
//!
//! Turns expressions such as "next Tuesday at 3pm", "tomorrow at 10am" or
//! "2025-01-10T15:00" into a concrete instant. Everything is resolved in UTC
//! against an injected clock; no timezone is inferred from the locale.

use crate::clock::Clock;
use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc, Weekday,
};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static RE_AMPM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})(?::(\d{2}))?\s*([ap])\.?m\b\.?").unwrap());
static RE_24H: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").unwrap());
static RE_AT_HOUR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bat\s+(\d{1,2})\b").unwrap());
static RE_ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})[-/](\d{1,2})[-/](\d{1,2})\b").unwrap());
static RE_MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b{}\s+(\d{{1,2}})(?:st|nd|rd|th)?(?:\s+(\d{{4}}))?\b", MONTH_PATTERN))
        .unwrap()
});
static RE_DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?{}(?:\s+(\d{{4}}))?\b",
        MONTH_PATTERN
    ))
    .unwrap()
});
static RE_OFFSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bin\s+(\d+|an?|one)\s+(minute|min|hour|hr|day|week)s?\b").unwrap()
});
static RE_RELATIVE_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(day after tomorrow|today|tonight|tomorrow|yesterday|now)\b").unwrap()
});
static RE_WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:(next|this|coming)\s+)?(monday|mon|tuesday|tues|tue|wednesday|wed|thursday|thurs|thur|thu|friday|fri|saturday|sat|sunday|sun)\b",
    )
    .unwrap()
});
static RE_NEXT_WEEK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnext\s+week\b").unwrap());
static RE_PERIOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(noon|midnight|morning|afternoon|evening|night)\b").unwrap());

const MONTH_PATTERN: &str = r"(january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec)";

/// Words allowed to remain once every date/time component is consumed.
const FILLER_WORDS: &[&str] = &["at", "on", "the", "around", "about", "@", "for"];

/// Resolves free-form expressions against a clock.
#[derive(Clone)]
pub struct DateTimeNormalizer {
    clock: Arc<dyn Clock>,
}

impl DateTimeNormalizer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn parse(&self, text: &str) -> Option<DateTime<Utc>> {
        parse_datetime(text, self.clock.now())
    }
}

/// Parse `text` relative to `now`. Returns `None` when no concrete date and
/// time can be resolved.
pub fn parse_datetime(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(parsed) = parse_absolute(trimmed) {
        debug!("Parsed '{}' as absolute timestamp {}", trimmed, parsed);
        return Some(parsed);
    }

    let parsed = parse_natural(trimmed, now.naive_utc()).map(|naive| naive.and_utc());
    debug!("Parsed '{}' as {:?}", trimmed, parsed);
    parsed
}

fn parse_absolute(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    // Minute precision with an explicit offset, e.g. 2025-01-10T15:00+02:00
    const ZONED_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M%:z",
        "%Y-%m-%dT%H:%M%z",
        "%Y-%m-%d %H:%M%:z",
        "%Y-%m-%d %H:%M%z",
        "%Y-%m-%d %H:%M:%S%:z",
    ];
    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let text = strip_utc_suffix(text);
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date.and_time(NaiveTime::MIN).and_utc());
        }
    }

    None
}

/// Drop a trailing `Z` or `UTC` designator from a numeric timestamp.
fn strip_utc_suffix(text: &str) -> &str {
    let stripped = text
        .strip_suffix("UTC")
        .or_else(|| text.strip_suffix('Z'))
        .map(str::trim_end);
    match stripped {
        Some(rest) if rest.ends_with(|c: char| c.is_ascii_digit()) => rest,
        _ => text,
    }
}

/// Which kind of date was found, to decide the default time of day.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DateKind {
    /// Today, tomorrow, weekdays: keep the current time of day.
    Relative,
    /// Calendar dates: midnight.
    Absolute,
}

#[derive(Debug, Default)]
struct Components {
    date: Option<(NaiveDate, DateKind)>,
    time: Option<NaiveTime>,
    /// Fallback time from words like "tonight" or "morning".
    period: Option<NaiveTime>,
    offset: Option<Duration>,
    now: bool,
}

impl Components {
    fn set_date(&mut self, date: NaiveDate, kind: DateKind) -> Option<()> {
        if self.date.is_some() {
            // Two competing dates, e.g. "tomorrow on friday"
            return None;
        }
        self.date = Some((date, kind));
        Some(())
    }

    fn set_time(&mut self, time: NaiveTime) -> Option<()> {
        if self.time.is_some() {
            return None;
        }
        self.time = Some(time);
        Some(())
    }

    fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.time.is_none()
            && self.period.is_none()
            && self.offset.is_none()
            && !self.now
    }
}

fn parse_natural(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let mut rest = text.to_lowercase().replace(',', " ");
    let today = now.date();
    let mut found = Components::default();

    if let Some(caps) = take(&RE_AMPM, &mut rest) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = if caps[2].is_empty() { 0 } else { caps[2].parse().ok()? };
        found.set_time(twelve_hour(hour, minute, &caps[3])?)?;
    }
    if let Some(caps) = take(&RE_24H, &mut rest) {
        found.set_time(NaiveTime::from_hms_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, 0)?)?;
    }
    if let Some(caps) = take(&RE_ISO_DATE, &mut rest) {
        let date =
            NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)?;
        found.set_date(date, DateKind::Absolute)?;
    }
    if let Some(caps) = take(&RE_MONTH_DAY, &mut rest) {
        let date = calendar_date(&caps[1], &caps[2], optional(&caps[3]), today)?;
        found.set_date(date, DateKind::Absolute)?;
    }
    if let Some(caps) = take(&RE_DAY_MONTH, &mut rest) {
        let date = calendar_date(&caps[2], &caps[1], optional(&caps[3]), today)?;
        found.set_date(date, DateKind::Absolute)?;
    }
    if let Some(caps) = take(&RE_AT_HOUR, &mut rest) {
        found.set_time(NaiveTime::from_hms_opt(caps[1].parse().ok()?, 0, 0)?)?;
    }
    if let Some(caps) = take(&RE_OFFSET, &mut rest) {
        let amount: i64 = match caps[1].as_str() {
            "a" | "an" | "one" => 1,
            n => n.parse().ok()?,
        };
        let offset = match caps[2].as_str() {
            "minute" | "min" => Duration::try_minutes(amount)?,
            "hour" | "hr" => Duration::try_hours(amount)?,
            "day" => Duration::try_days(amount)?,
            _ => Duration::try_weeks(amount)?,
        };
        found.offset = Some(offset);
    }
    if let Some(caps) = take(&RE_RELATIVE_DAY, &mut rest) {
        match caps[1].as_str() {
            "now" => found.now = true,
            "today" => found.set_date(today, DateKind::Relative)?,
            "tonight" => {
                found.set_date(today, DateKind::Relative)?;
                found.period = NaiveTime::from_hms_opt(20, 0, 0);
            }
            "tomorrow" => found.set_date(today.succ_opt()?, DateKind::Relative)?,
            "yesterday" => found.set_date(today.pred_opt()?, DateKind::Relative)?,
            _ => found.set_date(today.checked_add_signed(Duration::days(2))?, DateKind::Relative)?,
        }
    }
    if let Some(caps) = take(&RE_WEEKDAY, &mut rest) {
        let target = weekday(&caps[2])?;
        let inclusive = caps[1] == "this";
        found.set_date(upcoming(today, target, inclusive)?, DateKind::Relative)?;
    }
    if take(&RE_NEXT_WEEK, &mut rest).is_some() {
        found.set_date(today.checked_add_signed(Duration::weeks(1))?, DateKind::Relative)?;
    }
    if let Some(caps) = take(&RE_PERIOD, &mut rest) {
        let (hour, explicit) = match caps[1].as_str() {
            "noon" => (12, true),
            "midnight" => (0, true),
            "morning" => (9, false),
            "afternoon" => (14, false),
            "evening" => (18, false),
            _ => (20, false),
        };
        let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
        if explicit {
            found.set_time(time)?;
        } else {
            found.period = Some(time);
        }
    }

    let leftovers: Vec<&str> =
        rest.split_whitespace().filter(|word| !FILLER_WORDS.contains(word)).collect();
    if !leftovers.is_empty() {
        debug!("Unrecognised words in date/time expression: {:?}", leftovers);
        return None;
    }
    if found.is_empty() {
        return None;
    }

    if found.now || found.offset.is_some() {
        // Offsets are relative to the current instant and do not mix with dates
        if found.date.is_some() || found.time.is_some() || found.period.is_some() {
            return None;
        }
        return now.checked_add_signed(found.offset.unwrap_or_else(Duration::zero));
    }

    let time = found.time.or(found.period);
    let resolved = match (found.date, time) {
        (Some((date, _)), Some(time)) => date.and_time(time),
        (Some((date, DateKind::Relative)), None) => date.and_time(current_time_of_day(now)),
        (Some((date, DateKind::Absolute)), None) => date.and_time(NaiveTime::MIN),
        (None, Some(time)) => today.and_time(time),
        (None, None) => return None,
    };
    Some(resolved)
}

/// Remove the first match of `re` from `rest`, returning its groups.
/// Groups that did not participate come back as empty strings.
fn take(re: &Regex, rest: &mut String) -> Option<Vec<String>> {
    let caps = re.captures(rest)?;
    let whole = caps.get(0)?.range();
    let groups = caps.iter().map(|m| m.map_or_else(String::new, |m| m.as_str().to_string())).collect();
    rest.replace_range(whole, " ");
    Some(groups)
}

fn optional(group: &str) -> Option<&str> {
    (!group.is_empty()).then_some(group)
}

fn twelve_hour(hour: u32, minute: u32, meridiem: &str) -> Option<NaiveTime> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    let hour_24 = match (hour, meridiem) {
        (12, "a") => 0,
        (12, "p") => 12,
        (h, "p") => h + 12,
        (h, _) => h,
    };
    NaiveTime::from_hms_opt(hour_24, minute, 0)
}

fn calendar_date(month: &str, day: &str, year: Option<&str>, today: NaiveDate) -> Option<NaiveDate> {
    let month = month_number(month)?;
    let day: u32 = day.parse().ok()?;
    let year = match year {
        Some(y) => y.parse().ok()?,
        None => today.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn weekday(name: &str) -> Option<Weekday> {
    let day = match name.get(..3)? {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

/// Next date falling on `target`. With `inclusive`, today counts.
fn upcoming(today: NaiveDate, target: Weekday, inclusive: bool) -> Option<NaiveDate> {
    let delta = (7 + target.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64)
        % 7;
    let delta = if delta == 0 && !inclusive { 7 } else { delta };
    today.checked_add_signed(Duration::days(delta))
}

fn current_time_of_day(now: NaiveDateTime) -> NaiveTime {
    NaiveTime::from_hms_opt(now.hour(), now.minute(), now.second()).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use test_case::test_case;

    // Monday
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap()
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap())
    }

    #[test_case("2025-01-10T15:00", at(2025, 1, 10, 15, 0) ; "iso without seconds")]
    #[test_case("2025-01-10 15:00:30", Some(Utc.with_ymd_and_hms(2025, 1, 10, 15, 0, 30).unwrap()) ; "iso with space")]
    #[test_case("2025-01-10T15:00:00+02:00", at(2025, 1, 10, 13, 0) ; "rfc3339 offset")]
    #[test_case("2025-01-10T15:00Z", at(2025, 1, 10, 15, 0) ; "zulu without seconds")]
    #[test_case("2025-01-10T15:00+02:00", at(2025, 1, 10, 13, 0) ; "offset without seconds")]
    #[test_case("2025-01-10T15:00-0500", at(2025, 1, 10, 20, 0) ; "compact offset without seconds")]
    #[test_case("2025-01-10 15:00 UTC", at(2025, 1, 10, 15, 0) ; "utc suffix")]
    #[test_case("2025-01-10 15:00:30Z", Some(Utc.with_ymd_and_hms(2025, 1, 10, 15, 0, 30).unwrap()) ; "space separated zulu")]
    #[test_case("2025-01-10", at(2025, 1, 10, 0, 0) ; "bare date")]
    #[test_case("2025-01-10 at 3pm", at(2025, 1, 10, 15, 0) ; "iso date with spoken time")]
    #[test_case("tomorrow at 10am", at(2026, 10, 20, 10, 0) ; "tomorrow with time")]
    #[test_case("Tomorrow", at(2026, 10, 20, 8, 30) ; "tomorrow keeps time of day")]
    #[test_case("next Tuesday at 3pm", at(2026, 10, 20, 15, 0) ; "next weekday")]
    #[test_case("monday at 9am", at(2026, 10, 26, 9, 0) ; "same weekday rolls a week")]
    #[test_case("this monday at 5 p.m.", at(2026, 10, 19, 17, 0) ; "this weekday includes today")]
    #[test_case("Friday, 4:15pm", at(2026, 10, 23, 16, 15) ; "weekday with comma")]
    #[test_case("January 10 at 3:30 pm", at(2026, 1, 10, 15, 30) ; "month day")]
    #[test_case("10th of March 2027", at(2027, 3, 10, 0, 0) ; "day of month with year")]
    #[test_case("Dec 24th 2026 18:00", at(2026, 12, 24, 18, 0) ; "abbreviated month with 24h time")]
    #[test_case("in 2 hours", at(2026, 10, 19, 10, 30) ; "hour offset")]
    #[test_case("in an hour", at(2026, 10, 19, 9, 30) ; "article offset")]
    #[test_case("in 3 days", at(2026, 10, 22, 8, 30) ; "day offset")]
    #[test_case("tonight", at(2026, 10, 19, 20, 0) ; "tonight")]
    #[test_case("tonight at 7pm", at(2026, 10, 19, 19, 0) ; "tonight with time")]
    #[test_case("tomorrow morning", at(2026, 10, 20, 9, 0) ; "tomorrow morning")]
    #[test_case("noon", at(2026, 10, 19, 12, 0) ; "noon today")]
    #[test_case("12am tomorrow", at(2026, 10, 20, 0, 0) ; "midnight meridiem")]
    #[test_case("tomorrow at 14", at(2026, 10, 20, 14, 0) ; "bare hour after at")]
    #[test_case("next week", at(2026, 10, 26, 8, 30) ; "next week")]
    #[test_case("day after tomorrow at 9:45", at(2026, 10, 21, 9, 45) ; "day after tomorrow")]
    fn test_parse_datetime(input: &str, expected: Option<DateTime<Utc>>) {
        assert_eq!(parse_datetime(input, now()), expected, "input: {}", input);
    }

    #[test_case("blergh" ; "nonsense")]
    #[test_case("" ; "empty")]
    #[test_case("   " ; "blank")]
    #[test_case("13pm" ; "hour out of range")]
    #[test_case("february 30" ; "impossible date")]
    #[test_case("tomorrow or whenever" ; "unrecognised words")]
    #[test_case("tomorrow on friday" ; "competing dates")]
    #[test_case("in 2 hours tomorrow" ; "offset mixed with date")]
    #[test_case("25:00" ; "invalid 24h time")]
    fn test_unparseable(input: &str) {
        assert_eq!(parse_datetime(input, now()), None, "input: {}", input);
    }

    #[test]
    fn test_normalizer_uses_clock() {
        let normalizer = DateTimeNormalizer::new(Arc::new(FixedClock(now())));
        assert_eq!(normalizer.parse("tomorrow at 10am"), at(2026, 10, 20, 10, 0));
        assert_eq!(normalizer.parse("blergh"), None);
    }
}
