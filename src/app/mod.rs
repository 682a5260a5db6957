// Application core - one state record, a reducer that advances it, and the
// effect runner that does the async work the reducer asks for

pub mod commands;  // state snapshot + intent -> effect
pub mod effects;
pub mod grid;      // pane layout, cursor, focus
pub mod items;
pub mod message;
pub mod runner;    // executes effects on tokio, reports back as messages
pub mod tasks;     // repeating/delayed task handles
pub mod update;    // the reducer

pub use effects::{ApiCall, ApiRequest, Effect};
pub use grid::{Grid, PaneId};
pub use items::Item;
pub use message::{KeyInput, Message, PlaybackCommand};
pub use runner::EffectRunner;
pub use update::{init, update};

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::config::Config;
use crate::session::Credentials;
use crate::spotify::params::{DeviceParams, MarketParams};
use crate::spotify::types::{CurrentlyPlaying, Device, Playable, SimplifiedPlaylist, Track, User};

/// Knobs the reducer needs, lifted out of the config.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub market: String,
    pub poll_interval: Duration,
    pub page_size: u32,
    pub max_log_entries: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            market: config.spotify.market.clone(),
            poll_interval: config.network.poll_interval(),
            page_size: config.ui.playlist_page_size,
            max_log_entries: config.ui.max_log_entries.max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub credentials: Credentials,
    pub settings: Settings,

    pub profile: Option<User>,
    pub active_device: Option<Device>,
    pub currently_playing: Option<CurrentlyPlaying>,
    pub default_playlist: Option<SimplifiedPlaylist>,
    /// Playlist whose items the playlist pane is showing
    pub shown_playlist: Option<String>,
    pub playlist_items: HashMap<String, Vec<Playable>>,
    pub artist_tracks: HashMap<String, Vec<Track>>,

    pub grid: Grid,
    pub info: Option<Item>,
    pub messages: VecDeque<String>,
    pub errors: VecDeque<String>,

    pub viewport: (u16, u16),
    pub polling: bool,
    pub quitting: bool,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(credentials: Credentials, settings: Settings) -> Self {
        Self {
            credentials,
            settings,
            profile: None,
            active_device: None,
            currently_playing: None,
            default_playlist: None,
            shown_playlist: None,
            playlist_items: HashMap::new(),
            artist_tracks: HashMap::new(),
            grid: Grid::default(),
            info: None,
            messages: VecDeque::new(),
            errors: VecDeque::new(),
            viewport: (0, 0),
            polling: false,
            quitting: false,
            should_quit: false,
        }
    }

    pub fn push_message(&mut self, msg: impl Into<String>) {
        push_bounded(&mut self.messages, msg.into(), self.settings.max_log_entries);
    }

    pub fn push_error(&mut self, err: impl Into<String>) {
        push_bounded(&mut self.errors, err.into(), self.settings.max_log_entries);
    }

    pub fn market(&self) -> MarketParams {
        MarketParams::new(self.settings.market.clone())
    }

    /// Target for player commands; `None` leaves it to the remote.
    pub fn device_params(&self) -> DeviceParams {
        DeviceParams::new(self.active_device.as_ref().and_then(|d| d.id.clone()))
    }

    pub fn is_playing(&self) -> Option<bool> {
        self.currently_playing.as_ref().map(|c| c.is_playing)
    }
}

fn push_bounded(log: &mut VecDeque<String>, entry: String, max: usize) {
    log.push_back(entry);
    while log.len() > max {
        log.pop_front();
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::spotify::types::{Artist, SimplifiedArtist};
    use crate::spotify::{ClientInfo, TokenSet};
    use chrono::{TimeZone, Utc};

    pub fn credentials() -> Credentials {
        Credentials {
            client: ClientInfo::new("id", "secret", "http://127.0.0.1:8888/callback"),
            tokens: TokenSet {
                access_token: "access".into(),
                refresh_token: "refresh".into(),
                expires_at: Utc.with_ymd_and_hms(2026, 3, 1, 13, 0, 0).unwrap(),
            },
        }
    }

    pub fn state() -> AppState {
        AppState::new(credentials(), Settings::default())
    }

    pub fn track(id: &str) -> Track {
        Track {
            id: Some(id.into()),
            name: format!("track {id}"),
            artists: vec![SimplifiedArtist { id: None, name: "band".into(), uri: None }],
            album: None,
            duration_ms: 200_000,
            popularity: 50,
            explicit: false,
            is_local: false,
            uri: format!("spotify:track:{id}"),
        }
    }

    pub fn artist(id: &str) -> Artist {
        Artist {
            id: id.into(),
            name: format!("artist {id}"),
            genres: vec![],
            popularity: 10,
            uri: format!("spotify:artist:{id}"),
        }
    }

    pub fn playlist(id: &str) -> SimplifiedPlaylist {
        SimplifiedPlaylist {
            id: id.into(),
            name: format!("playlist {id}"),
            description: None,
            collaborative: false,
            owner: None,
            tracks: None,
            snapshot_id: None,
            uri: format!("spotify:playlist:{id}"),
        }
    }

    pub fn device(id: &str, active: bool, volume: Option<u8>) -> Device {
        Device {
            id: Some(id.into()),
            name: format!("device {id}"),
            device_type: "Computer".into(),
            is_active: active,
            is_private_session: false,
            is_restricted: false,
            volume_percent: volume,
            supports_volume: volume.is_some(),
        }
    }

    pub fn playing(is_playing: bool) -> CurrentlyPlaying {
        CurrentlyPlaying {
            device: None,
            repeat_state: None,
            shuffle_state: None,
            context: None,
            timestamp: 0,
            progress_ms: Some(1000),
            is_playing,
            item: Some(Playable::Track(track("now"))),
            currently_playing_type: "track".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logs_are_bounded() {
        let mut state = fixtures::state();
        state.settings.max_log_entries = 3;
        for i in 0..5 {
            state.push_error(format!("err {i}"));
        }
        assert_eq!(state.errors, VecDeque::from(vec!["err 2".to_string(), "err 3".into(), "err 4".into()]));
    }

    #[test]
    fn test_device_params_follow_active_device() {
        let mut state = fixtures::state();
        assert_eq!(state.device_params(), DeviceParams::default());
        state.active_device = Some(fixtures::device("d1", true, Some(50)));
        assert_eq!(state.device_params(), DeviceParams::new(Some("d1".into())));
    }
}
