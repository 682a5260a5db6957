use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// What the app was registered with on the developer dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl ClientInfo {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Checks all three fields up front and reports every missing one at once,
    /// so nobody has to fix their config three times in a row.
    pub fn validate(&self) -> Result<(), AuthError> {
        let mut missing = Vec::new();

        if self.client_id.trim().is_empty() {
            missing.push("provided client id is invalid");
        }
        if self.client_secret.trim().is_empty() {
            missing.push("provided client secret is invalid");
        }
        if self.redirect_uri.trim().is_empty() {
            missing.push("provided redirect uri is invalid");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AuthError::InvalidClientInfo(missing.join(", ")))
        }
    }
}

/// Raw body of the token endpoint, shared by the code exchange and refresh grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expires_in: i64,
    // The refresh grant may leave this out entirely; absent is not the same as revoked.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// A usable bearer/refresh pair. Both tokens always travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Builds the token set for a fresh authorization-code grant. Anything
    /// partial is an error, never a half-filled success.
    pub fn from_grant(resp: TokenResponse, now: DateTime<Utc>) -> Result<Self, AuthError> {
        if resp.access_token.is_empty() {
            return Err(AuthError::IncompleteGrant("an access token"));
        }

        let refresh_token = match resp.refresh_token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(AuthError::IncompleteGrant("a refresh token")),
        };

        if resp.expires_in <= 0 {
            return Err(AuthError::IncompleteGrant("a positive expires_in"));
        }

        Ok(Self {
            access_token: resp.access_token,
            refresh_token,
            expires_at: expires_at(now, resp.expires_in),
        })
    }

    /// Applies a refresh-grant response on top of the current set.
    pub fn renewed(&self, resp: TokenResponse, now: DateTime<Utc>) -> Result<Self, AuthError> {
        if resp.access_token.is_empty() {
            return Err(AuthError::EmptyAccessToken);
        }
        // an already-expired set would re-arm renewal with no delay
        if resp.expires_in <= 0 {
            return Err(AuthError::IncompleteGrant("a positive expires_in"));
        }

        let refresh_token = resp
            .refresh_token
            .filter(|token| !token.is_empty())
            .unwrap_or_else(|| self.refresh_token.clone());

        Ok(Self {
            access_token: resp.access_token,
            refresh_token,
            expires_at: expires_at(now, resp.expires_in),
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub fn expires_at(now: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    now + ChronoDuration::seconds(expires_in)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn response(access: &str, refresh: Option<&str>, expires_in: i64) -> TokenResponse {
        TokenResponse {
            access_token: access.to_string(),
            token_type: "Bearer".to_string(),
            scope: Some("user-top-read".to_string()),
            expires_in,
            refresh_token: refresh.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_lists_every_missing_field() {
        let err = ClientInfo::default().validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "provided client id is invalid, provided client secret is invalid, provided redirect uri is invalid"
        );

        let err = ClientInfo::new("id", "", "http://127.0.0.1:8888/callback")
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "provided client secret is invalid");

        assert!(ClientInfo::new("id", "secret", "http://127.0.0.1:8888/callback")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_grant_requires_both_tokens() {
        let tokens = TokenSet::from_grant(response("a", Some("r"), 3600), now()).unwrap();
        assert_eq!(tokens.access_token, "a");
        assert_eq!(tokens.refresh_token, "r");
        assert_eq!(tokens.expires_at, now() + ChronoDuration::seconds(3600));
        assert!(tokens.expires_at > now());

        assert!(matches!(
            TokenSet::from_grant(response("a", None, 3600), now()),
            Err(AuthError::IncompleteGrant(_))
        ));
        assert!(matches!(
            TokenSet::from_grant(response("", Some("r"), 3600), now()),
            Err(AuthError::IncompleteGrant(_))
        ));
        assert!(matches!(
            TokenSet::from_grant(response("a", Some("r"), 0), now()),
            Err(AuthError::IncompleteGrant(_))
        ));
    }

    #[test]
    fn test_renewal_keeps_refresh_token_when_omitted() {
        let current = TokenSet {
            access_token: "old".into(),
            refresh_token: "keep-me".into(),
            expires_at: now(),
        };

        let renewed = current.renewed(response("new", None, 3600), now()).unwrap();
        assert_eq!(renewed.access_token, "new");
        assert_eq!(renewed.refresh_token, "keep-me");

        let renewed = current.renewed(response("new", Some(""), 3600), now()).unwrap();
        assert_eq!(renewed.refresh_token, "keep-me");

        let renewed = current.renewed(response("new", Some("rotated"), 3600), now()).unwrap();
        assert_eq!(renewed.refresh_token, "rotated");
    }

    #[test]
    fn test_renewal_rejects_empty_access_token() {
        let current = TokenSet {
            access_token: "old".into(),
            refresh_token: "r".into(),
            expires_at: now(),
        };
        assert!(matches!(
            current.renewed(response("", Some("r2"), 3600), now()),
            Err(AuthError::EmptyAccessToken)
        ));
    }

    #[test]
    fn test_renewal_rejects_non_positive_lifetime() {
        let current = TokenSet {
            access_token: "old".into(),
            refresh_token: "r".into(),
            expires_at: now(),
        };
        for expires_in in [0, -30] {
            assert!(matches!(
                current.renewed(response("new", None, expires_in), now()),
                Err(AuthError::IncompleteGrant(_))
            ));
        }
    }

    #[test]
    fn test_expiry_boundary_counts_as_expired() {
        let tokens = TokenSet {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: now(),
        };
        assert!(tokens.is_expired(now()));
        assert!(!tokens.is_expired(now() - ChronoDuration::seconds(1)));
    }
}
