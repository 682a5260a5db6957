// Web API response models - only the fields the app actually looks at.
// Unknown fields are ignored by serde, so the remote can grow without breaking us.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    // a path default keeps serde from demanding `T: Default`
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedArtist {
    // Local files come back without ids
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub album_type: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub album: Option<Album>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub uri: String,
}

impl Track {
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub publisher: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub show: Option<Show>,
    #[serde(default)]
    pub uri: String,
}

/// Anything the player can have loaded: the `type` field picks the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Playable {
    Track(Track),
    Episode(Episode),
}

impl Playable {
    pub fn name(&self) -> &str {
        match self {
            Playable::Track(t) => &t.name,
            Playable::Episode(e) => &e.name,
        }
    }

    pub fn uri(&self) -> &str {
        match self {
            Playable::Track(t) => &t.uri,
            Playable::Episode(e) => &e.uri,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        match self {
            Playable::Track(t) => t.duration_ms,
            Playable::Episode(e) => e.duration_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistTracksRef {
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub collaborative: bool,
    #[serde(default)]
    pub owner: Option<PlaylistOwner>,
    #[serde(default)]
    pub tracks: Option<PlaylistTracksRef>,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub added_at: Option<String>,
    // Removed or region-locked entries come back as null
    #[serde(default)]
    pub track: Option<Playable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSnapshot {
    pub snapshot_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub device_type: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_private_session: bool,
    #[serde(default)]
    pub is_restricted: bool,
    #[serde(default)]
    pub volume_percent: Option<u8>,
    #[serde(default)]
    pub supports_volume: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Devices {
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackContext {
    #[serde(rename = "type", default)]
    pub context_type: String,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub uri: String,
}

/// Shared shape of `me/player` and `me/player/currently-playing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentlyPlaying {
    // currently-playing leaves the device out, me/player includes it
    #[serde(default)]
    pub device: Option<Device>,
    #[serde(default)]
    pub repeat_state: Option<String>,
    #[serde(default)]
    pub shuffle_state: Option<bool>,
    #[serde(default)]
    pub context: Option<PlaybackContext>,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub item: Option<Playable>,
    #[serde(default)]
    pub currently_playing_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Queue {
    #[serde(default)]
    pub currently_playing: Option<Playable>,
    #[serde(default)]
    pub queue: Vec<Playable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayHistory {
    pub track: Track,
    pub played_at: String,
    #[serde(default)]
    pub context: Option<PlaybackContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursors {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentlyPlayed {
    #[serde(default)]
    pub items: Vec<PlayHistory>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub cursors: Option<Cursors>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistTopTracks {
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Body for `PUT me/player/play`. Empty means "resume whatever was there".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPlayback {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uris: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPlayback {
    pub device_ids: Vec<String>,
    pub play: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItemsToPlaylist {
    pub uris: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playable_picks_variant_from_type_field() {
        let json = r#"{
            "currently_playing": {"type": "episode", "id": "e1", "name": "Pod", "uri": "spotify:episode:e1"},
            "queue": [
                {"type": "track", "id": "t1", "name": "Song", "uri": "spotify:track:t1",
                 "artists": [{"name": "Band"}], "duration_ms": 1000}
            ]
        }"#;

        let queue: Queue = serde_json::from_str(json).unwrap();
        assert!(matches!(queue.currently_playing, Some(Playable::Episode(_))));
        match &queue.queue[0] {
            Playable::Track(track) => {
                assert_eq!(track.name, "Song");
                assert_eq!(track.artist_names(), "Band");
            }
            other => panic!("expected a track, got {other:?}"),
        }
    }

    #[test]
    fn test_device_optional_fields() {
        let json = r#"{"devices": [
            {"id": null, "name": "Web Player", "type": "Computer", "is_active": false,
             "volume_percent": null, "supports_volume": false},
            {"id": "abc", "name": "Phone", "type": "Smartphone", "is_active": true,
             "volume_percent": 40, "supports_volume": true}
        ]}"#;

        let devices: Devices = serde_json::from_str(json).unwrap();
        assert_eq!(devices.devices[0].id, None);
        assert_eq!(devices.devices[0].volume_percent, None);
        assert_eq!(devices.devices[1].id.as_deref(), Some("abc"));
        assert_eq!(devices.devices[1].volume_percent, Some(40));
        assert!(devices.devices[1].supports_volume);
    }

    #[test]
    fn test_currently_playing_with_null_item() {
        let json = r#"{"timestamp": 1, "progress_ms": null, "is_playing": false,
                       "item": null, "currently_playing_type": "unknown"}"#;
        let playing: CurrentlyPlaying = serde_json::from_str(json).unwrap();
        assert!(playing.item.is_none());
        assert!(playing.device.is_none());
        assert!(!playing.is_playing);
    }

    #[test]
    fn test_start_playback_skips_absent_fields() {
        let body = serde_json::to_string(&StartPlayback::default()).unwrap();
        assert_eq!(body, "{}");

        let body = serde_json::to_string(&StartPlayback {
            uris: Some(vec!["spotify:track:t1".into()]),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, r#"{"uris":["spotify:track:t1"]}"#);
    }
}
