use directories::ProjectDirs;
use log::debug;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable pointing at an explicit config file.
pub const CONFIG_PATH_VAR: &str = "MEETBOT_CONFIG";

/// Write access to the user's calendars.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub contacts: ContactsConfig,
    pub google: GoogleConfig,
    pub language_model: LanguageModelConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ContactsConfig {
    pub csv_file: PathBuf,
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self { csv_file: PathBuf::from("contacts.csv") }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// OAuth client secret downloaded from the cloud console.
    pub credentials_path: PathBuf,
    /// Where the authorized credential is persisted.
    pub token_path: PathBuf,
    /// Local port the consent redirect lands on.
    pub redirect_port: u16,
    pub calendar_id: String,
    pub calendar_api_base: String,
    pub conference_request_id: String,
    /// Generate a fresh conferencing request id per event instead of the fixed one.
    pub unique_conference_ids: bool,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
            redirect_port: 76,
            calendar_id: "primary".to_string(),
            calendar_api_base: "https://www.googleapis.com/calendar/v3".to_string(),
            conference_request_id: "sample123".to_string(),
            unique_conference_ids: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LanguageModelConfig {
    pub model: String,
    pub api_base: String,
    /// Only ever sourced from the environment.
    #[serde(skip)]
    pub api_key: Option<SecretString>,
}

impl Default for LanguageModelConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            api_key: None,
        }
    }
}

impl Config {
    /// Defaults, then the config file (if any), then the process environment.
    ///
    /// A path given explicitly or through `$MEETBOT_CONFIG` must exist; the
    /// per-user default location is optional.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from))
            .or_else(|| default_config_path().filter(|path| path.exists()));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Config::default(),
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay environment variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("CSV_FILE") {
            self.contacts.csv_file = PathBuf::from(v);
        }
        if let Some(v) = get("CREDENTIALS_PATH") {
            self.google.credentials_path = PathBuf::from(v);
        }
        if let Some(v) = get("TOKEN_PATH") {
            self.google.token_path = PathBuf::from(v);
        }
        if let Some(v) = get("OAUTH_REDIRECT_PORT") {
            self.google.redirect_port = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { var: "OAUTH_REDIRECT_PORT", value: v })?;
        }
        if let Some(v) = get("CALENDAR_API_BASE") {
            self.google.calendar_api_base = v;
        }
        if let Some(v) = get("UNIQUE_CONFERENCE_IDS") {
            self.google.unique_conference_ids = match v.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue { var: "UNIQUE_CONFERENCE_IDS", value: v })
                }
            };
        }
        if let Some(v) = get("GEMINI_MODEL") {
            self.language_model.model = v;
        }
        if let Some(v) = get("GEMINI_API_BASE") {
            self.language_model.api_base = v;
        }
        if let Some(v) = get("GOOGLE_API_KEY") {
            self.language_model.api_key = Some(SecretString::from(v));
        }

        Ok(())
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "meetbot", "meetbot").map(|dirs| dirs.config_dir().join("config.toml"))
}
