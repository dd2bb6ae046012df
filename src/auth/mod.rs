//! Google OAuth authorization
//!
//! The [`Authorizer`] walks a small state machine until it holds a usable
//! credential: a persisted unexpired credential is used as-is, an expired one
//! is refreshed when possible, and anything else falls back to interactive
//! consent. Every newly obtained credential is persisted.

pub mod credential;
pub mod flow;
pub mod token_store;

use crate::clock::Clock;
use crate::config::GoogleConfig;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

pub use credential::Credential;
pub use flow::{GoogleOAuthFlow, OAuthFlow};
pub use token_store::{FileTokenStore, TokenStore};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid credential JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid OAuth endpoint URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("OAuth client secret file not found: {0}")]
    ClientSecretNotFound(PathBuf),
    #[error("OAuth client secret file {0} has no 'installed' or 'web' section")]
    InvalidClientSecret(PathBuf),
    #[error("Cannot listen for the OAuth redirect on port {port}: {source}")]
    Listener {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("Authorization was denied: {0}")]
    ConsentDenied(String),
    #[error("OAuth state mismatch in redirect")]
    StateMismatch,
    #[error("Redirect carried no authorization code")]
    FlowCancelled,
    #[error("Failed to exchange authorization code: {0}")]
    TokenExchange(String),
    #[error("Credential has no refresh token")]
    NoRefreshToken,
    #[error("Failed to refresh access token: {0}")]
    RefreshFailed(String),
}

/// Where the authorizer currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Unauthenticated,
    Expired(Credential),
    Valid(Credential),
}

pub struct Authorizer {
    store: Box<dyn TokenStore>,
    flow: Box<dyn OAuthFlow>,
    clock: Arc<dyn Clock>,
}

impl Authorizer {
    pub fn new(store: Box<dyn TokenStore>, flow: Box<dyn OAuthFlow>, clock: Arc<dyn Clock>) -> Self {
        Self { store, flow, clock }
    }

    /// File-backed store plus the browser consent flow.
    pub fn from_config(config: &GoogleConfig, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        let store = FileTokenStore::new(&config.token_path);
        let flow = GoogleOAuthFlow::new(config, clock.clone())?;
        Ok(Self::new(Box::new(store), Box::new(flow), clock))
    }

    /// State implied by whatever is persisted.
    pub fn initial_state(&self) -> AuthState {
        match self.store.load() {
            Ok(Some(credential)) => self.classify(credential),
            Ok(None) => AuthState::Unauthenticated,
            Err(e) => {
                // Consent will overwrite the unreadable file
                warn!("Ignoring unreadable stored credential: {}", e);
                AuthState::Unauthenticated
            }
        }
    }

    fn classify(&self, credential: Credential) -> AuthState {
        if credential.is_expired(self.clock.now()) {
            AuthState::Expired(credential)
        } else {
            AuthState::Valid(credential)
        }
    }

    /// Advance one transition. `Valid` is terminal.
    pub async fn step(&self, state: AuthState) -> Result<AuthState, AuthError> {
        match state {
            AuthState::Valid(credential) => Ok(AuthState::Valid(credential)),
            AuthState::Expired(credential) if credential.can_refresh() => {
                debug!("Stored credential expired, refreshing");
                match self.flow.refresh(&credential).await {
                    Ok(refreshed) => {
                        self.store.save(&refreshed)?;
                        Ok(AuthState::Valid(refreshed))
                    }
                    Err(e) => {
                        warn!("Token refresh failed, falling back to consent: {}", e);
                        Ok(AuthState::Unauthenticated)
                    }
                }
            }
            AuthState::Expired(_) => Ok(AuthState::Unauthenticated),
            AuthState::Unauthenticated => {
                info!("No valid credential, starting consent flow");
                let credential = self.flow.consent().await?;
                self.store.save(&credential)?;
                Ok(AuthState::Valid(credential))
            }
        }
    }

    /// Run the state machine to completion.
    pub async fn authorize(&self) -> Result<Credential, AuthError> {
        let mut state = self.initial_state();
        loop {
            state = match self.step(state).await? {
                AuthState::Valid(credential) => return Ok(credential),
                next => next,
            };
        }
    }
}
