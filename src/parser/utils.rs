//! Prompt construction and response cleanup shared by intent parsers.

use super::traits::{Intent, ParserError};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?|```").unwrap());

/// Sanitize user input to prevent injection
pub fn sanitize_user_input(input: &str) -> String {
    // Filter out control characters except for newlines and tabs
    input.chars().filter(|&c| !c.is_control() || c == '\n' || c == '\t').collect::<String>()
}

/// Instruction sent to the model for a single query.
pub fn build_prompt(query: &str) -> String {
    format!(
        "Analyze the following prompt: '{}'. \
         Extract the following information: \
         1. The recipient's name (key \"recipient\"). \
         2. The date and time of the meeting (key \"date_time\"). \
         3. A flag 'task' with value 1 if the task is scheduling a meeting, 0 otherwise (key \"task\"). \
         Return the result in a JSON format.",
        query
    )
}

/// Drop Markdown code fences (optionally tagged `json`) around a payload.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

/// Decode the model completion into an intent.
pub fn parse_intent_response(text: &str) -> Result<Intent, ParserError> {
    let cleaned = strip_code_fences(text);
    debug!("Cleaned model response: {}", cleaned);
    Ok(serde_json::from_str(&cleaned)?)
}

/// Read a task flag written as an integer, a boolean (`true` is 1) or a
/// numeric string. Anything else has no integer value.
pub fn task_flag(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
