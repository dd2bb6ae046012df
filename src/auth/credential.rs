use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tokens are treated as expired this long before their stated expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// OAuth2 token bundle authorizing calendar access.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credential {
    /// A credential without an expiry is assumed stale.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= now + Duration::seconds(EXPIRY_SKEW_SECS),
            None => true,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expiry", &self.expiry)
            .field("scopes", &self.scopes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn credential(expiry: Option<DateTime<Utc>>) -> Credential {
        Credential {
            access_token: "ya29.secret".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            expiry,
            scopes: vec![crate::config::CALENDAR_SCOPE.to_string()],
        }
    }

    #[test]
    fn test_expiry_with_skew() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        assert!(!credential(Some(now + Duration::minutes(30))).is_expired(now));
        assert!(credential(Some(now + Duration::seconds(30))).is_expired(now));
        assert!(credential(Some(now - Duration::minutes(1))).is_expired(now));
        assert!(credential(None).is_expired(now));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", credential(None));
        assert!(!rendered.contains("ya29.secret"));
        assert!(!rendered.contains("1//refresh"));
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"token": "abc", "refresh_token": null, "expiry": "2026-02-08T12:00:00Z"}"#;
        let cred: Credential = serde_json::from_str(json).unwrap();
        assert_eq!(cred.access_token, "abc");
        assert!(!cred.can_refresh());
        assert_eq!(cred.expiry, Some(Utc.with_ymd_and_hms(2026, 2, 8, 12, 0, 0).unwrap()));
        assert!(cred.scopes.is_empty());
    }
}
