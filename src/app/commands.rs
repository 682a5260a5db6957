// Intent -> effect. Each function looks at a read-only snapshot and describes
// the call to make; `None` means there is nothing sensible to do right now.

use super::effects::{ApiCall, Effect};
use super::AppState;
use crate::spotify::params::{
    PageParams, PlaylistItemsParams, QueueParams, RecentlyPlayedParams, SkipDirection, SkipParams,
    TopItemsParams, VolumeParams,
};

pub const VOLUME_STEP: i16 = 10;
const RECENT_LIMIT: u32 = 20;

fn request(state: &AppState, call: ApiCall) -> Effect {
    Effect::request(state.credentials.bearer(), call)
}

/// Everything the grid shows, fetched in one go. Completion order is not fixed.
pub fn load_all(state: &AppState) -> Vec<Effect> {
    let top = TopItemsParams {
        time_range: None,
        page: PageParams::first(state.settings.page_size),
    };
    vec![
        request(state, ApiCall::TopTracks(top)),
        request(state, ApiCall::TopArtists(top)),
        request(state, ApiCall::Profile),
        request(state, ApiCall::Playlists(PageParams::first(state.settings.page_size))),
        request(state, ApiCall::Devices),
        request(state, ApiCall::CurrentlyPlaying(state.market())),
        request(state, ApiCall::Queue),
        request(
            state,
            ApiCall::RecentlyPlayed(RecentlyPlayedParams {
                limit: Some(RECENT_LIMIT),
                ..Default::default()
            }),
        ),
    ]
}

pub fn renew_tokens(state: &AppState) -> Effect {
    Effect::RenewTokens {
        auth: state.credentials.client_auth(),
        at: state.credentials.tokens.expires_at,
    }
}

pub fn start_polling(state: &AppState) -> Effect {
    Effect::StartPolling {
        auth: state.credentials.bearer(),
        every: state.settings.poll_interval,
        market: state.market(),
    }
}

pub fn fetch_currently_playing(state: &AppState) -> Effect {
    request(state, ApiCall::CurrentlyPlaying(state.market()))
}

pub fn fetch_queue(state: &AppState) -> Effect {
    request(state, ApiCall::Queue)
}

pub fn fetch_devices(state: &AppState) -> Effect {
    request(state, ApiCall::Devices)
}

/// Pause when playing, resume when paused. No snapshot yet, nothing to toggle.
pub fn toggle_playback(state: &AppState) -> Option<Effect> {
    let call = match state.is_playing()? {
        true => ApiCall::Pause(state.device_params()),
        false => ApiCall::Resume(state.device_params()),
    };
    Some(request(state, call))
}

pub fn skip(state: &AppState, direction: SkipDirection) -> Option<Effect> {
    state.currently_playing.as_ref()?;
    Some(request(
        state,
        ApiCall::Skip(SkipParams {
            direction,
            device: state.device_params(),
        }),
    ))
}

/// Steps the active device's volume by `delta`, clamped to 0..=100. No-op
/// without a device that reports and supports volume, or when already at the edge.
pub fn change_volume(state: &AppState, delta: i16) -> Option<Effect> {
    let device = state.active_device.as_ref().filter(|d| d.supports_volume)?;
    let current = device.volume_percent?;
    let target = (current as i16 + delta).clamp(0, 100) as u8;
    if target == current {
        return None;
    }
    Some(request(
        state,
        ApiCall::SetVolume(VolumeParams {
            percent: target,
            device: state.device_params(),
        }),
    ))
}

pub fn play_uri(state: &AppState, uri: &str) -> Effect {
    request(
        state,
        ApiCall::PlayUri {
            device: state.device_params(),
            uri: uri.to_string(),
        },
    )
}

pub fn add_to_queue(state: &AppState, uri: &str) -> Effect {
    request(
        state,
        ApiCall::AddToQueue(QueueParams {
            uri: uri.to_string(),
            device: state.device_params(),
        }),
    )
}

pub fn add_to_default_playlist(state: &AppState, uri: &str) -> Option<Effect> {
    let playlist = state.default_playlist.as_ref()?;
    Some(request(
        state,
        ApiCall::AddToPlaylist {
            playlist_id: playlist.id.clone(),
            uris: vec![uri.to_string()],
        },
    ))
}

pub fn transfer_playback(state: &AppState, device_id: &str) -> Effect {
    request(
        state,
        ApiCall::Transfer {
            device_id: device_id.to_string(),
        },
    )
}

/// Cache hit means no call.
pub fn fetch_playlist_items(state: &AppState, playlist_id: &str) -> Option<Effect> {
    if state.playlist_items.contains_key(playlist_id) {
        return None;
    }
    Some(request(
        state,
        ApiCall::PlaylistItems {
            playlist_id: playlist_id.to_string(),
            params: PlaylistItemsParams {
                market: state.market(),
                page: PageParams::first(state.settings.page_size),
            },
        },
    ))
}

pub fn fetch_artist_top_tracks(state: &AppState, artist_id: &str) -> Option<Effect> {
    if state.artist_tracks.contains_key(artist_id) {
        return None;
    }
    Some(request(
        state,
        ApiCall::ArtistTopTracks {
            artist_id: artist_id.to_string(),
            market: state.market(),
        },
    ))
}
