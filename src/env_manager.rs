use log::{info, warn};
use std::env;
use std::path::PathBuf;

pub const REQUIRED_ENV_VARS: &[&str] = &["GOOGLE_API_KEY"];

// Names of optional environment variables
pub const OPTIONAL_ENV_VARS: &[&str] = &[
    "CSV_FILE",
    "CREDENTIALS_PATH",
    "TOKEN_PATH",
    "OAUTH_REDIRECT_PORT",
    "GEMINI_MODEL",
    "GEMINI_API_BASE",
    "CALENDAR_API_BASE",
    "UNIQUE_CONFERENCE_IDS",
    "MEETBOT_CONFIG",
    "RUST_LOG",
];

/// Load variables from a `.env` file in the working directory or its parents.
pub fn load_env_file() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            info!("Loaded environment from {:?}", path);
            Some(path)
        }
        Err(e) => {
            info!("No .env file found or error loading it: {}", e);
            None
        }
    }
}

/// Warn about every missing required variable. Returns whether all are present.
pub fn check_env_vars() -> bool {
    let lookup = |name: &str| env::var(name).ok();
    let overrides = optional_overrides(lookup);
    if !overrides.is_empty() {
        info!("Environment overrides in effect: {}", overrides.join(", "));
    }
    missing_vars(lookup).is_empty()
}

/// Optional variables that are set to a non-blank value.
pub fn optional_overrides<F>(lookup: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    OPTIONAL_ENV_VARS
        .iter()
        .copied()
        .filter(|var| lookup(var).is_some_and(|val| !val.trim().is_empty()))
        .collect()
}

pub fn missing_vars<F>(lookup: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    REQUIRED_ENV_VARS
        .iter()
        .copied()
        .filter(|var| match lookup(var) {
            Some(val) if !val.trim().is_empty() => false,
            _ => {
                warn!("Missing required environment variable: {}", var);
                true
            }
        })
        .collect()
}
