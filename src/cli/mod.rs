// One-shot commands - do a single thing against the active device, print the
// outcome and exit. No TUI, no poller.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use tracing::{info, warn};

use crate::session::Credentials;
use crate::spotify::params::{DeviceParams, MarketParams, SkipDirection, SkipParams};
use crate::spotify::types::{CurrentlyPlaying, StartPlayback};
use crate::spotify::{ApiError, Refresher, RequestAuth, SpotifyClient};
use crate::store::CredentialStore;

#[derive(Debug, Parser)]
#[command(name = "gridtunes")]
#[command(about = "A terminal Spotify client laid out as a grid of panes")]
pub struct Cmdline {
    /// Enable developer logging (debug for every target)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cmdline {
    pub fn parse_args<I>(args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        Self::parse_from(normalize_args(args))
    }
}

/// `-next`/`-prev`/`-toggle` are accepted as spellings of the long flags.
/// Clap would otherwise read `-next` as the short cluster `-n -e -x -t`.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| match arg.to_str() {
            Some("-next") => OsString::from("--next"),
            Some("-prev") => OsString::from("--prev"),
            Some("-toggle") => OsString::from("--toggle"),
            _ => arg,
        })
        .collect()
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Control playback on the active device
    Player(PlayerArgs),
}

#[derive(Debug, Clone, Copy, Default, Args)]
pub struct PlayerArgs {
    /// Pause if playing, resume if paused
    #[arg(short = 'p', long = "toggle")]
    pub toggle: bool,
    /// Skip to the next track
    #[arg(short = 'n', long = "next")]
    pub next: bool,
    /// Skip to the previous track
    #[arg(short = 'b', long = "prev")]
    pub prev: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Toggle,
    Skip(SkipDirection),
}

impl PlayerArgs {
    /// Exactly one flag must be set.
    pub fn action(&self) -> Result<PlayerAction> {
        match (self.toggle, self.next, self.prev) {
            (true, false, false) => Ok(PlayerAction::Toggle),
            (false, true, false) => Ok(PlayerAction::Skip(SkipDirection::Next)),
            (false, false, true) => Ok(PlayerAction::Skip(SkipDirection::Previous)),
            (false, false, false) => bail!("player needs one of -p, -n or -b"),
            _ => bail!("player takes only one of -p, -n or -b"),
        }
    }
}

/// Holds what a one-shot needs, and retries once with fresh tokens when the
/// remote says the access token is no longer good.
pub struct Cli<'a> {
    client: SpotifyClient,
    refresher: Refresher,
    store: &'a CredentialStore,
    credentials: Credentials,
    market: MarketParams,
}

impl<'a> Cli<'a> {
    pub fn new(
        client: SpotifyClient,
        refresher: Refresher,
        store: &'a CredentialStore,
        credentials: Credentials,
        market: impl Into<String>,
    ) -> Self {
        Self {
            client,
            refresher,
            store,
            credentials,
            market: MarketParams::new(market),
        }
    }

    pub async fn run(&mut self, command: Command) -> Result<String> {
        match command {
            Command::Player(args) => self.player(args.action()?).await,
        }
    }

    pub async fn player(&mut self, action: PlayerAction) -> Result<String> {
        match self.attempt(action).await {
            Err(e) if e.is_unauthorized() => {
                warn!("access token rejected, refreshing once");
                self.renew().await?;
                Ok(self.attempt(action).await?)
            }
            other => Ok(other?),
        }
    }

    async fn renew(&mut self) -> Result<()> {
        let tokens = self
            .refresher
            .refresh(&self.credentials.client_auth(), Utc::now())
            .await
            .context("could not refresh the access token")?;
        self.store.update_tokens(&tokens)?;
        self.credentials.tokens = tokens;
        Ok(())
    }

    async fn attempt(&self, action: PlayerAction) -> Result<String, ApiError> {
        let auth = self.credentials.bearer();
        let state = match self.client.playback_state(&auth, &self.market).await {
            Ok(state) => state,
            Err(ApiError::NoContent) => {
                return Err(ApiError::Remote {
                    status: 404,
                    body: "no active device".into(),
                })
            }
            Err(e) => return Err(e),
        };
        let device = DeviceParams::new(state.device.as_ref().and_then(|d| d.id.clone()));

        match action {
            PlayerAction::Toggle if state.is_playing => {
                self.client.pause(&auth, &device).await?;
                info!("paused");
                Ok(format!("paused {}", now_playing(&state)))
            }
            PlayerAction::Toggle => {
                self.client
                    .start_playback(&auth, &device, &StartPlayback::default())
                    .await?;
                info!("resumed");
                Ok(format!("resumed {}", now_playing(&state)))
            }
            PlayerAction::Skip(direction) => {
                self.client.skip(&auth, &SkipParams { direction, device }).await?;
                let after = self.now_playing_after_skip(&auth).await;
                Ok(match (direction, after) {
                    (SkipDirection::Next, Some(title)) => format!("skipped to {title}"),
                    (SkipDirection::Previous, Some(title)) => format!("back to {title}"),
                    (SkipDirection::Next, None) => "skipped to next".to_string(),
                    (SkipDirection::Previous, None) => "skipped to previous".to_string(),
                })
            }
        }
    }

    /// Best effort, the skip already went through.
    async fn now_playing_after_skip(&self, auth: &RequestAuth) -> Option<String> {
        let state = self.client.currently_playing(auth, &self.market).await.ok()?;
        state.item.as_ref().map(|item| item.name().to_string())
    }
}

fn now_playing(state: &CurrentlyPlaying) -> String {
    state
        .item
        .as_ref()
        .map(|item| item.name().to_string())
        .unwrap_or_else(|| "playback".into())
}
