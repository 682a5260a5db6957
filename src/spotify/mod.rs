// Spotify integration - OAuth login, token refresh and the Web API calls the app makes
// Nothing in here keeps credentials between calls; they ride along in a RequestAuth

pub mod auth;     // authorization-code grant + callback listener
pub mod client;   // request builders and the shared response decoder
pub mod context;  // per-request credentials
pub mod error;
pub mod params;   // query parameters as data
pub mod refresh;  // refresh-token grant
pub mod tokens;
pub mod types;    // response/request bodies

pub use auth::Authorizer;
pub use client::{Endpoints, SpotifyClient};
pub use context::{ClientAuth, RequestAuth};
pub use error::{ApiError, AuthError};
pub use refresh::Refresher;
pub use tokens::{ClientInfo, TokenResponse, TokenSet};
