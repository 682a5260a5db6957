// GridTunes Library - a Spotify remote for the terminal
// Everything async talks to the reducer through messages, nothing else mutates app state

pub mod app;      // state, reducer, effects and the runner that executes them
pub mod cli;      // one-shot player commands
pub mod config;   // settings and preferences
pub mod logging;  // tracing subscriber + rolling file
pub mod session;  // first run / login / refresh at startup
pub mod spotify;  // auth, token refresh, Web API client
pub mod store;    // sqlite credential row
pub mod ui;       // terminal interface

#[cfg(test)]
mod test_support;

// Export the stuff other modules actually use
pub use app::{AppState, Effect, Message};
pub use config::Config;
pub use session::Credentials;
pub use spotify::{Authorizer, Refresher, SpotifyClient};
pub use store::CredentialStore;
