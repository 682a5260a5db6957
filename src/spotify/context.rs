// Request-scoped credentials. Every outgoing call gets one of these handed to it;
// nothing in the client keeps tokens around between calls.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::{ApiError, ClientInfo, TokenSet};

/// Client credentials plus the refresh token, for the token endpoint only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAuth {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl ClientAuth {
    /// `Basic base64(client_id:client_secret)`
    pub fn basic_header(&self) -> String {
        basic_header(&self.client_id, &self.client_secret)
    }
}

/// The two ways a request can authenticate. They never mix on one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestAuth {
    Bearer(String),
    Client(ClientAuth),
}

impl RequestAuth {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        RequestAuth::Bearer(access_token.into())
    }

    pub fn client(info: &ClientInfo, tokens: &TokenSet) -> Self {
        RequestAuth::Client(ClientAuth {
            client_id: info.client_id.clone(),
            client_secret: info.client_secret.clone(),
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
        })
    }

    pub fn access_token(&self) -> Result<&str, ApiError> {
        match self {
            RequestAuth::Bearer(token) if !token.is_empty() => Ok(token),
            _ => Err(ApiError::AccessTokenNotFound),
        }
    }

    pub fn client_auth(&self) -> Result<&ClientAuth, ApiError> {
        match self {
            RequestAuth::Client(auth) => Ok(auth),
            RequestAuth::Bearer(_) => Err(ApiError::AuthInfoNotFound),
        }
    }
}

pub fn basic_header(client_id: &str, client_secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{client_id}:{client_secret}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_basic_header_encoding() {
        // "id:secret" -> aWQ6c2VjcmV0
        assert_eq!(basic_header("id", "secret"), "Basic aWQ6c2VjcmV0");
    }

    #[test]
    fn test_modes_do_not_leak_into_each_other() {
        let bearer = RequestAuth::bearer("abc");
        assert_eq!(bearer.access_token().unwrap(), "abc");
        assert!(matches!(bearer.client_auth(), Err(ApiError::AuthInfoNotFound)));

        let tokens = TokenSet {
            access_token: "abc".into(),
            refresh_token: "r".into(),
            expires_at: Utc::now(),
        };
        let client = RequestAuth::client(&ClientInfo::new("id", "secret", "uri"), &tokens);
        assert!(matches!(client.access_token(), Err(ApiError::AccessTokenNotFound)));
        assert_eq!(client.client_auth().unwrap().refresh_token, "r");
    }

    #[test]
    fn test_empty_bearer_is_missing() {
        assert!(matches!(
            RequestAuth::bearer("").access_token(),
            Err(ApiError::AccessTokenNotFound)
        ));
    }
}
