// What a pane row can hold. Closed set, matched on instead of dispatched through a trait.

use crate::spotify::types::{Artist, Device, Episode, Playable, SimplifiedPlaylist, Track};

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Artist(Artist),
    Track(Track),
    Playlist(SimplifiedPlaylist),
    Device(Device),
    Episode(Episode),
}

impl From<Playable> for Item {
    fn from(playable: Playable) -> Self {
        match playable {
            Playable::Track(track) => Item::Track(track),
            Playable::Episode(episode) => Item::Episode(episode),
        }
    }
}

impl Item {
    /// One-line text for list rows.
    pub fn label(&self) -> String {
        match self {
            Item::Artist(artist) => artist.name.clone(),
            Item::Track(track) if track.artists.is_empty() => track.name.clone(),
            Item::Track(track) => format!("{} - {}", track.name, track.artist_names()),
            Item::Playlist(playlist) => match &playlist.tracks {
                Some(tracks) => format!("{} ({})", playlist.name, tracks.total),
                None => playlist.name.clone(),
            },
            Item::Device(device) => {
                let marker = if device.is_active { "* " } else { "" };
                format!("{marker}{} [{}]", device.name, device.device_type)
            }
            Item::Episode(episode) => match &episode.show {
                Some(show) => format!("{} - {}", episode.name, show.name),
                None => episode.name.clone(),
            },
        }
    }

    /// Uri the player accepts for queueing/playing. Only tracks and episodes.
    pub fn playable_uri(&self) -> Option<&str> {
        let uri = match self {
            Item::Track(track) => track.uri.as_str(),
            Item::Episode(episode) => episode.uri.as_str(),
            _ => return None,
        };
        (!uri.is_empty()).then_some(uri)
    }

    /// Key/value rows for the info panel.
    pub fn details(&self) -> Vec<(&'static str, String)> {
        match self {
            Item::Artist(artist) => vec![
                ("artist", artist.name.clone()),
                ("genres", artist.genres.join(", ")),
                ("popularity", artist.popularity.to_string()),
            ],
            Item::Track(track) => vec![
                ("track", track.name.clone()),
                ("artists", track.artist_names()),
                (
                    "album",
                    track.album.as_ref().map(|a| a.name.clone()).unwrap_or_default(),
                ),
                ("length", format_duration(track.duration_ms)),
            ],
            Item::Playlist(playlist) => vec![
                ("playlist", playlist.name.clone()),
                ("description", playlist.description.clone().unwrap_or_default()),
                (
                    "owner",
                    playlist
                        .owner
                        .as_ref()
                        .and_then(|o| o.display_name.clone())
                        .unwrap_or_default(),
                ),
                (
                    "tracks",
                    playlist.tracks.as_ref().map(|t| t.total).unwrap_or(0).to_string(),
                ),
            ],
            Item::Device(device) => vec![
                ("device", device.name.clone()),
                ("id", device.id.clone().unwrap_or_else(|| "-".into())),
                ("type", device.device_type.clone()),
                (
                    "volume",
                    device
                        .volume_percent
                        .map(|v| format!("{v}%"))
                        .unwrap_or_else(|| "-".into()),
                ),
                ("active", device.is_active.to_string()),
            ],
            Item::Episode(episode) => vec![
                ("episode", episode.name.clone()),
                (
                    "show",
                    episode.show.as_ref().map(|s| s.name.clone()).unwrap_or_default(),
                ),
                ("length", format_duration(episode.duration_ms)),
            ],
        }
    }
}

pub fn format_duration(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}
