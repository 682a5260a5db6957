// Session setup - gets from "whatever is on disk" to a usable token pair
// First run registers the client, no tokens means log in, stale tokens get refreshed

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tracing::{info, warn};
use url::Url;

use crate::spotify::{Authorizer, ClientInfo, Refresher, RequestAuth, TokenSet};
use crate::store::{CredentialStore, StoredCredentials};

/// The live session: client registration plus a token pair that was valid at setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client: ClientInfo,
    pub tokens: TokenSet,
}

impl Credentials {
    pub fn bearer(&self) -> RequestAuth {
        RequestAuth::bearer(self.tokens.access_token.clone())
    }

    pub fn client_auth(&self) -> RequestAuth {
        RequestAuth::client(&self.client, &self.tokens)
    }
}

pub fn is_token_expired(tokens: &TokenSet, now: DateTime<Utc>) -> bool {
    tokens.is_expired(now)
}

pub fn is_new_login(stored: &StoredCredentials) -> bool {
    stored.tokens.is_none()
}

/// Makes sure the row exists. A configured client that differs from the
/// stored one replaces it, dropping the old tokens with it.
pub fn register(store: &CredentialStore, configured: &ClientInfo) -> Result<StoredCredentials> {
    match store.load()? {
        Some(stored) if stored.client == *configured || configured.validate().is_err() => Ok(stored),
        Some(_) => {
            info!("client registration changed, a new login is needed");
            insert(store, configured)
        }
        None => {
            info!("first run, storing client registration");
            insert(store, configured)
        }
    }
}

fn insert(store: &CredentialStore, client: &ClientInfo) -> Result<StoredCredentials> {
    store.insert(client)?;
    Ok(StoredCredentials {
        client: client.clone(),
        tokens: None,
        authorized: false,
    })
}

/// Runs the whole startup dance. `present` gets the authorization url when a
/// login is needed (print it, open a browser).
pub async fn setup<F>(
    store: &CredentialStore,
    configured: &ClientInfo,
    authorizer: &Authorizer,
    refresher: &Refresher,
    present: F,
) -> Result<Credentials>
where
    F: FnOnce(Url) + Send + 'static,
{
    let stored = register(store, configured)?;
    let client = stored.client.clone();

    let tokens = match stored.tokens {
        None => {
            let (url_tx, url_rx) = oneshot::channel();
            tokio::spawn(async move {
                if let Ok(url) = url_rx.await {
                    present(url);
                }
            });

            let tokens = authorizer
                .authorize(&client, url_tx)
                .await
                .context("login failed")?;
            store.update_tokens(&tokens)?;
            tokens
        }
        Some(tokens) if is_token_expired(&tokens, Utc::now()) => {
            info!("stored access token expired, refreshing");
            let auth = RequestAuth::client(&client, &tokens);
            let renewed = match refresher.refresh(&auth, Utc::now()).await {
                Ok(renewed) => renewed,
                Err(e) => {
                    warn!(error = %e, "refresh at startup failed");
                    return Err(e).context("could not refresh the stored token");
                }
            };
            store.update_tokens(&renewed)?;
            renewed
        }
        Some(tokens) => tokens,
    };

    Ok(Credentials { client, tokens })
}
