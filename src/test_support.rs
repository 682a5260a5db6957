// Test helpers: an in-process HTTP server on an ephemeral port standing in for
// the accounts service and the Web API.

use std::sync::{Arc, Mutex};

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub struct FakeServer {
    pub base: String,
    handle: JoinHandle<()>,
}

impl FakeServer {
    pub async fn start(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Self {
            base: format!("http://{addr}"),
            handle,
        }
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Shared log of what the fake server saw.
#[derive(Debug, Clone, Default)]
pub struct Recorded(Arc<Mutex<Vec<String>>>);

impl Recorded {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// A port nobody is listening on right now.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Accounts service that logs in and refreshes without complaint.
///
/// `/authorize` follows the redirect like a browser would; `/api/token`
/// answers the code grant with `access-1`/`refresh-1` and the refresh grant
/// with `access-2` and no new refresh token. Each grant type is recorded.
pub fn accounts_router(grants: Recorded) -> axum::Router {
    use axum::extract::{Form, Query};
    use axum::routing::{get, post};
    use axum::Json;
    use std::collections::HashMap;

    axum::Router::new()
        .route(
            "/authorize",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let redirect = format!(
                    "{}?code=the-code&state={}",
                    q.get("redirect_uri").cloned().unwrap_or_default(),
                    q.get("state").cloned().unwrap_or_default()
                );
                tokio::spawn(async move {
                    let _ = reqwest::get(redirect).await;
                });
                "<html>login</html>"
            }),
        )
        .route(
            "/api/token",
            post(move |Form(form): Form<HashMap<String, String>>| {
                let grants = grants.clone();
                async move {
                    let grant = form.get("grant_type").cloned().unwrap_or_default();
                    grants.push(grant.clone());
                    let body = if grant == "refresh_token" {
                        serde_json::json!({"access_token": "access-2", "token_type": "Bearer", "expires_in": 3600})
                    } else {
                        serde_json::json!({
                            "access_token": "access-1",
                            "token_type": "Bearer",
                            "expires_in": 3600,
                            "refresh_token": "refresh-1",
                        })
                    };
                    Json(body)
                }
            }),
        )
}
