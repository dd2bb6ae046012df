//! Gemini parser implementation
//!
//! Sends the intent-extraction prompt to the Generative Language API and
//! decodes the completion into an [`Intent`].

use super::traits::{Intent, IntentParser, ParserError};
use super::utils::{build_prompt, parse_intent_response, sanitize_user_input};
use crate::config::LanguageModelConfig;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

const MAX_QUERY_LEN: usize = 1000;

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Intent parser backed by a Gemini model.
pub struct GeminiParser {
    client: Client,
    api_base: String,
    model: String,
    api_key: Option<SecretString>,
}

impl GeminiParser {
    pub fn new(config: &LanguageModelConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config
                .api_key
                .as_ref()
                .map(|key| SecretString::from(key.expose_secret().to_string())),
        }
    }

    /// Send a single instruction and return the completion text.
    pub async fn generate(&self, prompt: &str) -> Result<String, ParserError> {
        let api_key = self.api_key.as_ref().ok_or(ParserError::MissingApiKey)?;
        let url = format!("{}/v1beta/models/{}:generateContent", self.api_base, self.model);

        debug!("Calling {} ({} prompt chars)", url, prompt.len());
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key.expose_secret())])
            .json(&json!({
                "contents": [
                    { "parts": [ { "text": prompt } ] }
                ]
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ParserError::Api { status: status.as_u16(), message });
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = body.text().ok_or(ParserError::EmptyCompletion)?;
        debug!("Raw completion: {}", text);
        Ok(text)
    }
}

#[async_trait]
impl IntentParser for GeminiParser {
    async fn parse_intent(&self, query: &str) -> Result<Intent, ParserError> {
        let query = sanitize_user_input(query.trim());
        if query.is_empty() {
            return Err(ParserError::EmptyQuery);
        }
        if query.chars().count() > MAX_QUERY_LEN {
            return Err(ParserError::QueryTooLong(MAX_QUERY_LEN));
        }

        let completion = self.generate(&build_prompt(&query)).await?;
        parse_intent_response(&completion)
    }
}
