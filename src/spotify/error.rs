// Error types for the Spotify side of things
// ApiError covers a single remote call, AuthError covers a whole grant attempt

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed url: {0}")]
    Url(#[from] url::ParseError),

    #[error("unable to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// 204 from the remote. Not a failure for most player endpoints, it just
    /// means there is nothing to hand back (e.g. nothing is playing).
    #[error("status: 204, message: no content available")]
    NoContent,

    #[error("status: {status}, message: {body}")]
    Remote { status: u16, body: String },

    #[error("access token could not be found within the provided request context")]
    AccessTokenNotFound,

    #[error("authorization info has not been provided through the request context")]
    AuthInfoNotFound,

    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
}

impl ApiError {
    pub fn is_no_content(&self) -> bool {
        matches!(self, ApiError::NoContent)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NoContent => Some(204),
            ApiError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The access token was rejected. Worth one refresh before giving up.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Every missing piece of client configuration, comma separated.
    #[error("{0}")]
    InvalidClientInfo(String),

    #[error("invalid redirect uri {uri:?}: {reason}")]
    InvalidRedirectUri { uri: String, reason: String },

    #[error("unable to bind callback listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("an authorization attempt is already in flight")]
    AttemptInProgress,

    #[error("deadline exceeded after {0:?} waiting for the authorization callback")]
    TimedOut(Duration),

    #[error("callback listener stopped before delivering a result")]
    CallbackDropped,

    #[error("token grant is missing {0}")]
    IncompleteGrant(&'static str),

    #[error("refresh token was not refreshed: remote returned an empty access token")]
    EmptyAccessToken,

    #[error(transparent)]
    Api(#[from] ApiError),
}
