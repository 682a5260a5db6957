// Authorization-code login. One attempt = one random state, one short-lived
// callback listener on the redirect uri, one code exchange.
//
// The listener only lives inside `authorize`: the CallbackServer guard tears it
// down on every way out of the function, early returns and timeouts included.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use rand::RngCore;
use serde::Deserialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use super::context::basic_header;
use super::params::QueryParams;
use super::{ApiError, AuthError, ClientInfo, SpotifyClient, TokenResponse, TokenSet};

pub const CALLBACK_PATH: &str = "/callback";
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Everything the app asks for at login, sent space separated.
pub const SCOPES: [&str; 14] = [
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "playlist-read-private",
    "playlist-read-collaborative",
    "playlist-modify-private",
    "playlist-modify-public",
    "user-read-playback-position",
    "user-top-read",
    "user-read-recently-played",
    "user-library-modify",
    "user-library-read",
    "user-read-email",
    "user-read-private",
];

const STATE_BYTES: usize = 24;

/// Anti-forgery token, fresh per attempt.
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

struct AuthorizeParams<'a> {
    info: &'a ClientInfo,
    state: &'a str,
}

impl QueryParams for AuthorizeParams<'_> {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("response_type", "code".to_string()),
            ("client_id", self.info.client_id.clone()),
            ("scope", SCOPES.join(" ")),
            ("redirect_uri", self.info.redirect_uri.clone()),
            ("state", self.state.to_string()),
        ]
    }
}

pub fn authorization_url(base: &str, info: &ClientInfo, state: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(base)?;
    AuthorizeParams { info, state }.apply(&mut url);
    Ok(url)
}

/// Pulls the address to listen on out of the redirect uri.
pub fn callback_addr(redirect_uri: &str) -> Result<String, AuthError> {
    let invalid = |reason: &str| AuthError::InvalidRedirectUri {
        uri: redirect_uri.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(redirect_uri).map_err(|e| invalid(&e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid("the callback listener only speaks plain http"));
    }
    if url.path() != CALLBACK_PATH {
        return Err(invalid("path must be /callback"));
    }
    let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| invalid("missing port"))?;

    Ok(format!("{host}:{port}"))
}

/// What the accounts service appends to the redirect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackRejection {
    #[error("authorization denied: {0}")]
    Denied(String),
    #[error("state mismatch")]
    StateMismatch,
    #[error("callback carried no code")]
    MissingCode,
    #[error("attempt already settled")]
    AlreadySettled,
}

/// Returns the code when the callback belongs to this attempt and succeeded.
pub fn validate_callback(params: &CallbackParams, expected_state: &str) -> Result<String, CallbackRejection> {
    if let Some(error) = &params.error {
        return Err(CallbackRejection::Denied(error.clone()));
    }
    if params.state.as_deref() != Some(expected_state) {
        return Err(CallbackRejection::StateMismatch);
    }
    match &params.code {
        Some(code) if !code.is_empty() => Ok(code.clone()),
        _ => Err(CallbackRejection::MissingCode),
    }
}

type ExchangeResult = Result<TokenResponse, ApiError>;

/// Per-attempt state shared with the callback route.
struct CallbackSession {
    state: String,
    info: ClientInfo,
    client: SpotifyClient,
    result_tx: Mutex<Option<oneshot::Sender<ExchangeResult>>>,
}

impl CallbackSession {
    fn is_settled(&self) -> bool {
        self.result_tx.lock().map(|slot| slot.is_none()).unwrap_or(true)
    }

    fn deliver(&self, result: ExchangeResult) {
        let sender = match self.result_tx.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        match sender {
            Some(tx) => {
                if tx.send(result).is_err() {
                    debug!("authorizer stopped waiting before the exchange finished");
                }
            }
            None => warn!("dropping a second exchange result for the same attempt"),
        }
    }

    async fn exchange(&self, code: &str) -> ExchangeResult {
        let basic = basic_header(&self.info.client_id, &self.info.client_secret);
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.info.redirect_uri.as_str()),
        ];
        self.client.request_token(&basic, &form).await
    }
}

async fn handle_callback(
    State(session): State<Arc<CallbackSession>>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, &'static str) {
    let checked = if session.is_settled() {
        Err(CallbackRejection::AlreadySettled)
    } else {
        validate_callback(&params, &session.state)
    };

    let code = match checked {
        Ok(code) => code,
        Err(rejection) => {
            // nothing is delivered; the waiting side runs into its timeout
            warn!(%rejection, "authorization callback rejected");
            return (StatusCode::BAD_REQUEST, "Authorization failed. You can close this tab.");
        }
    };

    let result = session.exchange(&code).await;
    let ok = result.is_ok();
    if let Err(e) = &result {
        warn!(error = %e, "authorization code exchange failed");
    }
    session.deliver(result);

    if ok {
        (StatusCode::OK, "Logged in. You can close this tab and go back to the terminal.")
    } else {
        (StatusCode::BAD_GATEWAY, "Token exchange failed. Check the terminal for details.")
    }
}

/// Owns the callback listener task. Dropping it stops the listener.
struct CallbackServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CallbackServer {
    async fn bind(addr: &str, session: Arc<CallbackSession>) -> Result<Self, AuthError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| AuthError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        let local = listener.local_addr().map_err(|source| AuthError::Bind {
            addr: addr.to_string(),
            source,
        })?;

        let router = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .with_state(session);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                warn!(error = %e, "callback listener failed");
            }
        });

        debug!(%local, "callback listener up");
        Ok(Self {
            addr: local,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Graceful stop, falling back to abort if a connection hangs around.
    async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(mut handle) = self.handle.take() {
            if tokio::time::timeout(Duration::from_secs(1), &mut handle).await.is_err() {
                handle.abort();
                let _ = handle.await;
            }
        }
        debug!(addr = %self.addr, "callback listener down");
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!(addr = %self.addr, "callback listener aborted");
        }
    }
}

/// Runs login attempts, one at a time.
pub struct Authorizer {
    client: SpotifyClient,
    callback_timeout: Duration,
    settle_delay: Duration,
    gate: tokio::sync::Mutex<()>,
}

impl Authorizer {
    pub fn new(client: SpotifyClient) -> Self {
        Self {
            client,
            callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_timeouts(mut self, callback_timeout: Duration, settle_delay: Duration) -> Self {
        self.callback_timeout = callback_timeout;
        self.settle_delay = settle_delay;
        self
    }

    /// Runs the whole grant. The authorization url goes out once through
    /// `url_tx` so the caller can show it or open a browser.
    pub async fn authorize(
        &self,
        info: &ClientInfo,
        url_tx: oneshot::Sender<Url>,
    ) -> Result<TokenSet, AuthError> {
        let _attempt = self
            .gate
            .try_lock()
            .map_err(|_| AuthError::AttemptInProgress)?;

        info.validate()?;
        let addr = callback_addr(&info.redirect_uri)?;
        let state = generate_state();

        let (result_tx, result_rx) = oneshot::channel();
        let session = Arc::new(CallbackSession {
            state: state.clone(),
            info: info.clone(),
            client: self.client.clone(),
            result_tx: Mutex::new(Some(result_tx)),
        });
        let server = CallbackServer::bind(&addr, session).await?;

        // give the listener a moment before anything can redirect to it
        tokio::time::sleep(self.settle_delay).await;

        let auth_url = authorization_url(&self.client.endpoints().authorize, info, &state)?;
        if url_tx.send(auth_url.clone()).is_err() {
            debug!("nobody picked up the authorization url");
        }

        info!("waiting for authorization callback");
        // the page itself is for the user's browser; only the redirect matters
        self.client
            .http()
            .get(auth_url)
            .send()
            .await
            .map_err(ApiError::from)?;

        let outcome = tokio::time::timeout(self.callback_timeout, result_rx).await;
        server.shutdown().await;

        let response = match outcome {
            Err(_) => {
                warn!(timeout = ?self.callback_timeout, "authorization timed out");
                return Err(AuthError::TimedOut(self.callback_timeout));
            }
            Ok(Err(_)) => return Err(AuthError::CallbackDropped),
            Ok(Ok(result)) => result?,
        };

        let tokens = TokenSet::from_grant(response, Utc::now())?;
        info!(expires_at = %tokens.expires_at, "authorization complete");
        Ok(tokens)
    }
}
