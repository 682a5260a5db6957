// Effects are plain values describing work for the runner. Building one does
// nothing; the runner executes it and turns the outcome into a Message.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::spotify::params::{
    DeviceParams, MarketParams, PageParams, PlaylistItemsParams, QueueParams,
    RecentlyPlayedParams, SkipParams, TopItemsParams, VolumeParams,
};
use crate::spotify::{RequestAuth, TokenSet};

/// One remote call. Each produces exactly one message.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Profile,
    TopArtists(TopItemsParams),
    TopTracks(TopItemsParams),
    Playlists(PageParams),
    PlaylistItems { playlist_id: String, params: PlaylistItemsParams },
    ArtistTopTracks { artist_id: String, market: MarketParams },
    Devices,
    CurrentlyPlaying(MarketParams),
    Queue,
    RecentlyPlayed(RecentlyPlayedParams),

    Resume(DeviceParams),
    PlayUri { device: DeviceParams, uri: String },
    Pause(DeviceParams),
    Skip(SkipParams),
    SetVolume(VolumeParams),
    AddToQueue(QueueParams),
    Transfer { device_id: String },
    AddToPlaylist { playlist_id: String, uris: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub auth: RequestAuth,
    pub call: ApiCall,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Request(ApiRequest),
    PersistTokens(TokenSet),
    /// (Re)arms the renewal timer; replaces any pending one.
    RenewTokens { auth: RequestAuth, at: DateTime<Utc> },
    /// (Re)starts the currently-playing poller; replaces any running one.
    StartPolling { auth: RequestAuth, every: Duration, market: MarketParams },
    Shutdown,
}

impl Effect {
    pub fn request(auth: RequestAuth, call: ApiCall) -> Self {
        Effect::Request(ApiRequest { auth, call })
    }
}
