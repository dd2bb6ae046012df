//! OAuth2 consent and refresh against Google's endpoints.
//!
//! Consent runs the installed-app authorization code flow: a listener on a
//! fixed localhost port receives the browser redirect, the code is exchanged
//! with PKCE, and the resulting tokens become a [`Credential`].

use super::{AuthError, Credential};
use crate::clock::Clock;
use crate::config::{GoogleConfig, CALENDAR_SCOPE};
use async_trait::async_trait;
use chrono::Duration;
use log::{debug, info, warn};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

type GoogleOAuthClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Obtains fresh credentials.
#[async_trait]
pub trait OAuthFlow: Send + Sync {
    /// Interactive consent in the user's browser.
    async fn consent(&self) -> Result<Credential, AuthError>;
    /// Silent refresh using the credential's refresh token.
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError>;
}

/// Client secret file as downloaded from the cloud console.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecretEntry>,
    web: Option<ClientSecretEntry>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretEntry {
    client_id: String,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    auth_uri: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

pub struct GoogleOAuthFlow {
    client_secret_path: PathBuf,
    redirect_port: u16,
    http: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl GoogleOAuthFlow {
    pub fn new(config: &GoogleConfig, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        // Token endpoints must not follow redirects
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            client_secret_path: config.credentials_path.clone(),
            redirect_port: config.redirect_port,
            http,
            clock,
        })
    }

    fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/", self.redirect_port)
    }

    fn client(&self) -> Result<GoogleOAuthClient, AuthError> {
        let entry = load_client_secret(&self.client_secret_path)?;
        let mut client = BasicClient::new(ClientId::new(entry.client_id))
            .set_auth_uri(AuthUrl::new(entry.auth_uri)?)
            .set_token_uri(TokenUrl::new(entry.token_uri)?)
            .set_redirect_uri(RedirectUrl::new(self.redirect_uri())?);
        if let Some(secret) = entry.client_secret {
            client = client.set_client_secret(ClientSecret::new(secret));
        }
        Ok(client)
    }

    fn to_credential(
        &self,
        token: &BasicTokenResponse,
        previous_refresh: Option<&str>,
    ) -> Credential {
        let now = self.clock.now();
        let expiry = token
            .expires_in()
            .and_then(|d| Duration::from_std(d).ok())
            .map(|d| now + d);
        let scopes = token
            .scopes()
            .map(|scopes| scopes.iter().map(|s| s.as_str().to_string()).collect())
            .unwrap_or_else(|| vec![CALENDAR_SCOPE.to_string()]);

        Credential {
            access_token: token.access_token().secret().clone(),
            refresh_token: token
                .refresh_token()
                .map(|t| t.secret().clone())
                .or_else(|| previous_refresh.map(str::to_string)),
            expiry,
            scopes,
        }
    }
}

#[async_trait]
impl OAuthFlow for GoogleOAuthFlow {
    async fn consent(&self) -> Result<Credential, AuthError> {
        let client = self.client()?;
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, csrf_state) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(CALENDAR_SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        let listener = TcpListener::bind(("127.0.0.1", self.redirect_port))
            .await
            .map_err(|source| AuthError::Listener { port: self.redirect_port, source })?;

        println!("Please visit this URL to authorize calendar access:\n\n{}\n", auth_url);
        info!("Opening browser for Google OAuth consent...");
        if let Err(e) = open::that(auth_url.as_str()) {
            warn!("Failed to open browser: {}", e);
        }

        let code = wait_for_auth_code(&listener, csrf_state.secret()).await?;
        let token = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(&self.http)
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        info!("Calendar access granted");
        Ok(self.to_credential(&token, None))
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
        let refresh_token = credential.refresh_token.as_deref().ok_or(AuthError::NoRefreshToken)?;
        let client = self.client()?;
        let token = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        debug!("Access token refreshed");
        Ok(self.to_credential(&token, Some(refresh_token)))
    }
}

fn load_client_secret(path: &Path) -> Result<ClientSecretEntry, AuthError> {
    if !path.exists() {
        return Err(AuthError::ClientSecretNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let file: ClientSecretFile = serde_json::from_str(&content)?;
    file.installed
        .or(file.web)
        .ok_or_else(|| AuthError::InvalidClientSecret(path.to_path_buf()))
}

/// Accept redirects until one carries our state, then answer the browser.
async fn wait_for_auth_code(listener: &TcpListener, expected_state: &str) -> Result<String, AuthError> {
    loop {
        let (mut stream, peer) = listener.accept().await?;
        let mut buffer = vec![0u8; 8192];
        let n = stream.read(&mut buffer).await?;
        let request = String::from_utf8_lossy(&buffer[..n]);
        debug!("OAuth callback from {}", peer);

        let Some(callback) = parse_callback(&request) else {
            // Browsers also ask for /favicon.ico and the like
            send_response(&mut stream, "404 Not Found", "Waiting for authorization...").await;
            continue;
        };

        let outcome = callback.into_code(expected_state);
        let message = match &outcome {
            Ok(_) => "Authorization successful! You can close this tab and return to the terminal.",
            Err(_) => "Authorization failed. You can close this tab.",
        };
        send_response(&mut stream, "200 OK", message).await;
        return outcome;
    }
}

#[derive(Debug, Default, PartialEq)]
struct Callback {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

impl Callback {
    fn into_code(self, expected_state: &str) -> Result<String, AuthError> {
        if let Some(error) = self.error {
            return Err(AuthError::ConsentDenied(error));
        }
        if self.state.as_deref() != Some(expected_state) {
            return Err(AuthError::StateMismatch);
        }
        self.code.filter(|c| !c.is_empty()).ok_or(AuthError::FlowCancelled)
    }
}

/// Pull the OAuth parameters out of `GET /?code=...&state=... HTTP/1.1`.
fn parse_callback(request: &str) -> Option<Callback> {
    let target = request.lines().next()?.split_whitespace().nth(1)?;
    let url = url::Url::parse(&format!("http://localhost{}", target)).ok()?;

    let mut callback = Callback::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => callback.code = Some(value.into_owned()),
            "state" => callback.state = Some(value.into_owned()),
            "error" => callback.error = Some(value.into_owned()),
            _ => {}
        }
    }
    (callback != Callback::default()).then_some(callback)
}

async fn send_response(stream: &mut tokio::net::TcpStream, status: &str, message: &str) {
    let body = format!(
        "<html><body style=\"font-family: system-ui; text-align: center; padding: 40px;\">\
         <h2>{}</h2></body></html>",
        message
    );
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!("Failed to answer OAuth callback: {}", e);
    }
    let _ = stream.flush().await;
}
