// Everything the reducer reacts to: keys from the terminal and results coming
// back from effects. All of it arrives through one queue, one at a time.

use crate::spotify::types::{
    Artist, CurrentlyPlaying, Device, Playable, PlayHistory, Queue, SimplifiedPlaylist, Track,
    User,
};
use crate::spotify::TokenSet;

/// Terminal-independent key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Enter,
    Esc,
    CtrlC,
}

/// A player command that went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackCommand {
    Resume,
    Pause,
    Next,
    Previous,
    Volume(u8),
    PlayUri(String),
    Queued(String),
    Transferred(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Key(KeyInput),
    Resize { width: u16, height: u16 },

    ProfileLoaded(User),
    TopArtistsLoaded(Vec<Artist>),
    TopTracksLoaded(Vec<Track>),
    PlaylistsLoaded(Vec<SimplifiedPlaylist>),
    PlaylistItemsLoaded { playlist_id: String, items: Vec<Playable> },
    ArtistTopTracksLoaded { artist_id: String, tracks: Vec<Track> },
    DevicesLoaded(Vec<Device>),
    /// `None` is the remote's "nothing is playing"
    CurrentlyPlayingLoaded(Option<CurrentlyPlaying>),
    QueueLoaded(Queue),
    RecentlyPlayedLoaded(Vec<PlayHistory>),

    PlaybackUpdated(PlaybackCommand),
    PlaylistItemsAdded { playlist_id: String, snapshot_id: String },

    TokensRenewed(TokenSet),
    TokensPersisted,
    PollingStopped,

    AppErr(String),
    Shutdown,
}
