// Refresh-token grant. Stateless apart from the timeout: the caller hands in the
// current credentials and gets the renewed set back.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{AuthError, RequestAuth, SpotifyClient, TokenSet};

pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Refresher {
    client: SpotifyClient,
    timeout: Duration,
}

impl Refresher {
    pub fn new(client: SpotifyClient) -> Self {
        Self {
            client,
            timeout: DEFAULT_REFRESH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `auth` must be the client-credentials form of the context. An empty
    /// access token in the answer fails the refresh and leaves the current
    /// tokens as they were.
    pub async fn refresh(&self, auth: &RequestAuth, now: DateTime<Utc>) -> Result<TokenSet, AuthError> {
        let client_auth = auth.client_auth()?;
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", client_auth.refresh_token.as_str()),
            ("client_id", client_auth.client_id.as_str()),
        ];

        let response = tokio::time::timeout(
            self.timeout,
            self.client.request_token(&client_auth.basic_header(), &form),
        )
        .await
        .map_err(|_| {
            warn!(timeout = ?self.timeout, "token refresh timed out");
            AuthError::TimedOut(self.timeout)
        })??;

        let current = TokenSet {
            access_token: client_auth.access_token.clone(),
            refresh_token: client_auth.refresh_token.clone(),
            expires_at: now,
        };
        let renewed = current.renewed(response, now)?;
        debug!(expires_at = %renewed.expires_at, "access token refreshed");
        Ok(renewed)
    }
}
