//! The reducer.
//!
//! `update` is the only place application state changes. It runs to completion
//! for one message, returns the effects to run, and never reads the clock:
//! time only shows up inside message payloads.

use tracing::debug;

use super::commands::{self, VOLUME_STEP};
use super::effects::Effect;
use super::grid::{Direction, MediaButton, PaneId, PaneKind};
use super::items::Item;
use super::message::{KeyInput, Message, PlaybackCommand};
use super::AppState;
use crate::spotify::params::SkipDirection;

/// Startup batch: every pane's data, the renewal timer and the poller.
/// Nothing is focused yet.
pub fn init(state: &mut AppState) -> Vec<Effect> {
    state.grid.unfocus();
    state.polling = true;
    let mut effects = commands::load_all(state);
    effects.push(commands::renew_tokens(state));
    effects.push(commands::start_polling(state));
    effects
}

pub fn update(state: &mut AppState, msg: Message) -> Vec<Effect> {
    match msg {
        Message::Key(key) => handle_key(state, key),
        Message::Resize { width, height } => {
            state.viewport = (width, height);
            vec![]
        }

        Message::ProfileLoaded(user) => {
            let name = user.display_name.clone().unwrap_or_else(|| user.id.clone());
            state.push_message(format!("signed in as {name}"));
            state.profile = Some(user);
            vec![]
        }
        Message::TopArtistsLoaded(artists) => {
            state.grid.set_items(PaneId::Artists, artists.into_iter().map(Item::Artist).collect());
            vec![]
        }
        Message::TopTracksLoaded(tracks) => {
            state.grid.set_items(PaneId::Tracks, tracks.into_iter().map(Item::Track).collect());
            vec![]
        }
        Message::PlaylistsLoaded(playlists) => {
            // keep the default pointing at fresh data
            if let Some(current) = &state.default_playlist {
                if let Some(fresh) = playlists.iter().find(|p| p.id == current.id) {
                    state.default_playlist = Some(fresh.clone());
                }
            }
            state
                .grid
                .set_items(PaneId::Playlists, playlists.into_iter().map(Item::Playlist).collect());
            vec![]
        }
        Message::PlaylistItemsLoaded { playlist_id, items } => {
            if state.shown_playlist.as_deref() == Some(playlist_id.as_str()) {
                show_playlist_items(state, &items);
            }
            state.playlist_items.insert(playlist_id, items);
            vec![]
        }
        Message::ArtistTopTracksLoaded { artist_id, tracks } => {
            state.artist_tracks.insert(artist_id, tracks);
            vec![]
        }
        Message::DevicesLoaded(devices) => {
            state.active_device = devices.iter().find(|d| d.is_active).cloned();
            state.grid.set_items(PaneId::Devices, devices.into_iter().map(Item::Device).collect());
            vec![]
        }
        Message::CurrentlyPlayingLoaded(snapshot) => {
            if let Some(device) = snapshot.as_ref().and_then(|s| s.device.clone()) {
                state.active_device = Some(device);
            }
            state.currently_playing = snapshot;
            vec![]
        }
        Message::QueueLoaded(queue) => {
            state
                .grid
                .set_items(PaneId::Queue, queue.queue.into_iter().map(Item::from).collect());
            vec![]
        }
        Message::RecentlyPlayedLoaded(history) => {
            let items = history.into_iter().map(|h| Item::Track(h.track)).collect();
            state.grid.set_items(PaneId::Recent, items);
            vec![]
        }

        Message::PlaybackUpdated(command) => playback_updated(state, command),
        Message::PlaylistItemsAdded { playlist_id, snapshot_id } => {
            debug!(%playlist_id, %snapshot_id, "playlist changed");
            // cached items are stale now
            state.playlist_items.remove(&playlist_id);
            state.push_message("added to default playlist");
            if state.shown_playlist.as_deref() == Some(playlist_id.as_str()) {
                commands::fetch_playlist_items(state, &playlist_id).into_iter().collect()
            } else {
                vec![]
            }
        }

        Message::TokensRenewed(tokens) => {
            state.credentials.tokens = tokens.clone();
            state.push_message("access token refreshed");
            state.polling = true;
            vec![
                Effect::PersistTokens(tokens),
                commands::renew_tokens(state),
                commands::start_polling(state),
            ]
        }
        Message::TokensPersisted => {
            debug!("tokens persisted");
            vec![]
        }
        Message::PollingStopped => {
            state.polling = false;
            state.push_message("playback polling stopped, press r to restart");
            vec![]
        }

        Message::AppErr(err) => {
            state.push_error(err);
            vec![]
        }
        Message::Shutdown => {
            state.should_quit = true;
            vec![]
        }
    }
}

fn playback_updated(state: &mut AppState, command: PlaybackCommand) -> Vec<Effect> {
    match command {
        PlaybackCommand::Resume | PlaybackCommand::Pause => {
            let playing = command == PlaybackCommand::Resume;
            if let Some(snapshot) = state.currently_playing.as_mut() {
                snapshot.is_playing = playing;
            }
            vec![commands::fetch_currently_playing(state)]
        }
        // one result, then the follow-ups as separate effects
        PlaybackCommand::Next | PlaybackCommand::Previous | PlaybackCommand::PlayUri(_) => vec![
            commands::fetch_currently_playing(state),
            commands::fetch_queue(state),
        ],
        PlaybackCommand::Volume(percent) => {
            if let Some(device) = state.active_device.as_mut() {
                device.volume_percent = Some(percent);
            }
            vec![]
        }
        PlaybackCommand::Queued(uri) => {
            state.push_message(format!("queued {uri}"));
            vec![commands::fetch_queue(state)]
        }
        PlaybackCommand::Transferred(device_id) => {
            state.push_message(format!("playback moved to {device_id}"));
            vec![
                commands::fetch_devices(state),
                commands::fetch_currently_playing(state),
            ]
        }
    }
}

fn handle_key(state: &mut AppState, key: KeyInput) -> Vec<Effect> {
    let focused = state.grid.is_focused();
    match key {
        KeyInput::CtrlC => quit(state),
        KeyInput::Esc if focused => {
            state.grid.unfocus();
            vec![]
        }
        KeyInput::Esc | KeyInput::Char('q') if !focused => quit(state),

        KeyInput::Char('p') => commands::toggle_playback(state).into_iter().collect(),
        KeyInput::Char('n') => commands::skip(state, SkipDirection::Next).into_iter().collect(),
        KeyInput::Char('b') => commands::skip(state, SkipDirection::Previous)
            .into_iter()
            .collect(),
        KeyInput::Char('+') | KeyInput::Char('=') => {
            commands::change_volume(state, VOLUME_STEP).into_iter().collect()
        }
        KeyInput::Char('-') => commands::change_volume(state, -VOLUME_STEP).into_iter().collect(),
        KeyInput::Char('r') => refresh(state),

        _ if focused => handle_focused_key(state, key),
        _ => handle_grid_key(state, key),
    }
}

fn quit(state: &mut AppState) -> Vec<Effect> {
    if state.quitting {
        return vec![];
    }
    state.quitting = true;
    vec![Effect::Shutdown]
}

fn refresh(state: &mut AppState) -> Vec<Effect> {
    state.push_message("refreshing");
    let mut effects = commands::load_all(state);
    effects.push(commands::renew_tokens(state));
    if !state.polling {
        state.polling = true;
        effects.push(commands::start_polling(state));
    }
    effects
}

fn handle_grid_key(state: &mut AppState, key: KeyInput) -> Vec<Effect> {
    let direction = match key {
        KeyInput::Up | KeyInput::Char('k') => Direction::Up,
        KeyInput::Down | KeyInput::Char('j') => Direction::Down,
        KeyInput::Left | KeyInput::Char('h') => Direction::Left,
        KeyInput::Right | KeyInput::Char('l') => Direction::Right,
        KeyInput::Enter => {
            state.grid.focus();
            return vec![];
        }
        _ => return vec![],
    };
    state.grid.move_cursor(direction);
    vec![]
}

fn handle_focused_key(state: &mut AppState, key: KeyInput) -> Vec<Effect> {
    let Some(pane) = state.grid.current_mut() else {
        return vec![];
    };
    let pane_id = pane.id;

    match (pane_id.kind(), key) {
        (PaneKind::List, KeyInput::Up | KeyInput::Char('k')) => {
            pane.move_selection(-1);
            vec![]
        }
        (PaneKind::List, KeyInput::Down | KeyInput::Char('j')) => {
            pane.move_selection(1);
            vec![]
        }
        (PaneKind::Media, KeyInput::Left | KeyInput::Char('h')) => {
            pane.move_selection(-1);
            vec![]
        }
        (PaneKind::Media, KeyInput::Right | KeyInput::Char('l')) => {
            pane.move_selection(1);
            vec![]
        }
        (PaneKind::Media, KeyInput::Enter) => match pane.selected_button() {
            Some(button) => press(state, button),
            None => vec![],
        },
        (PaneKind::List, KeyInput::Enter) => match pane.selected_item().cloned() {
            Some(item) => select(state, pane_id, item),
            None => vec![],
        },
        (PaneKind::List, KeyInput::Char('a')) => {
            match pane.selected_item().and_then(Item::playable_uri).map(str::to_string) {
                Some(uri) => vec![commands::add_to_queue(state, &uri)],
                None => vec![],
            }
        }
        (PaneKind::List, KeyInput::Char('s')) => {
            let Some(uri) = pane.selected_item().and_then(Item::playable_uri).map(str::to_string)
            else {
                return vec![];
            };
            match commands::add_to_default_playlist(state, &uri) {
                Some(effect) => vec![effect],
                None => {
                    state.push_message("no default playlist, pick one with d in the playlists pane");
                    vec![]
                }
            }
        }
        (PaneKind::List, KeyInput::Char('d')) if pane_id == PaneId::Playlists => {
            if let Some(Item::Playlist(playlist)) = pane.selected_item().cloned() {
                state.push_message(format!("default playlist: {}", playlist.name));
                state.default_playlist = Some(playlist);
            }
            vec![]
        }
        _ => vec![],
    }
}

fn press(state: &mut AppState, button: MediaButton) -> Vec<Effect> {
    let effect = match button {
        MediaButton::Previous => commands::skip(state, SkipDirection::Previous),
        MediaButton::PlayPause => commands::toggle_playback(state),
        MediaButton::Next => commands::skip(state, SkipDirection::Next),
        MediaButton::VolumeDown => commands::change_volume(state, -VOLUME_STEP),
        MediaButton::VolumeUp => commands::change_volume(state, VOLUME_STEP),
    };
    effect.into_iter().collect()
}

/// Enter on a list row: show it in the info panel, then whatever the row
/// implies for its pane.
fn select(state: &mut AppState, pane: PaneId, item: Item) -> Vec<Effect> {
    state.info = Some(item.clone());
    match item {
        Item::Playlist(playlist) => {
            state.shown_playlist = Some(playlist.id.clone());
            match state.playlist_items.get(&playlist.id).cloned() {
                Some(items) => {
                    show_playlist_items(state, &items);
                    vec![]
                }
                None => {
                    state.grid.set_items(PaneId::PlaylistItems, vec![]);
                    commands::fetch_playlist_items(state, &playlist.id)
                        .into_iter()
                        .collect()
                }
            }
        }
        Item::Artist(artist) => commands::fetch_artist_top_tracks(state, &artist.id)
            .into_iter()
            .collect(),
        Item::Device(device) => match device.id {
            Some(id) if !device.is_active => vec![commands::transfer_playback(state, &id)],
            Some(_) => vec![],
            None => {
                state.push_message(format!("{} cannot be targeted", device.name));
                vec![]
            }
        },
        Item::Track(_) | Item::Episode(_) => {
            debug!(?pane, "playing selected item");
            match item_uri(state) {
                Some(uri) => vec![commands::play_uri(state, &uri)],
                None => vec![],
            }
        }
    }
}

fn item_uri(state: &AppState) -> Option<String> {
    state.info.as_ref()?.playable_uri().map(str::to_string)
}

fn show_playlist_items(state: &mut AppState, items: &[crate::spotify::types::Playable]) {
    let rows = items.iter().cloned().map(Item::from).collect();
    state.grid.set_items(PaneId::PlaylistItems, rows);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::effects::ApiCall;
    use crate::app::fixtures;
    use crate::app::grid::Position;
    use crate::spotify::types::{Playable, Queue};
    use crate::spotify::TokenSet;
    use chrono::{TimeZone, Utc};

    fn keys(state: &mut AppState, keys: &[KeyInput]) -> Vec<Effect> {
        keys.iter()
            .flat_map(|k| update(state, Message::Key(*k)))
            .collect()
    }

    fn calls(effects: &[Effect]) -> Vec<ApiCall> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Request(req) => Some(req.call.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_init_batch() {
        let mut state = fixtures::state();
        let effects = init(&mut state);

        assert_eq!(calls(&effects).len(), 8);
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::RenewTokens { at, .. } if *at == state.credentials.tokens.expires_at
        )));
        assert!(effects.iter().any(|e| matches!(e, Effect::StartPolling { .. })));
        assert!(!state.grid.is_focused());
        assert!(state.polling);
    }

    #[test]
    fn test_reducer_is_deterministic() {
        let msgs = vec![
            Message::Key(KeyInput::Right),
            Message::TopTracksLoaded(vec![fixtures::track("1"), fixtures::track("2")]),
            Message::Key(KeyInput::Enter),
            Message::Key(KeyInput::Down),
            Message::Key(KeyInput::Enter),
            Message::CurrentlyPlayingLoaded(Some(fixtures::playing(true))),
            Message::Key(KeyInput::Char('p')),
        ];

        let run = || {
            let mut state = fixtures::state();
            let effects: Vec<Effect> = msgs.iter().flat_map(|m| update(&mut state, m.clone())).collect();
            (state, effects)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_esc_unfocuses_then_quits_once() {
        let mut state = fixtures::state();
        assert!(keys(&mut state, &[KeyInput::Enter]).is_empty());
        assert!(state.grid.is_focused());

        assert!(keys(&mut state, &[KeyInput::Esc]).is_empty());
        assert!(!state.grid.is_focused());
        assert!(!state.quitting);

        assert_eq!(keys(&mut state, &[KeyInput::Esc]), vec![Effect::Shutdown]);
        // a second quit request does not close anything twice
        assert!(keys(&mut state, &[KeyInput::Char('q')]).is_empty());

        assert!(!state.should_quit);
        update(&mut state, Message::Shutdown);
        assert!(state.should_quit);
    }

    #[test]
    fn test_q_while_focused_does_not_quit() {
        let mut state = fixtures::state();
        keys(&mut state, &[KeyInput::Enter]);
        assert!(keys(&mut state, &[KeyInput::Char('q')]).is_empty());
        assert!(!state.quitting);
        assert_eq!(keys(&mut state, &[KeyInput::CtrlC]), vec![Effect::Shutdown]);
    }

    #[test]
    fn test_grid_navigation_clamps() {
        let mut state = fixtures::state();
        keys(&mut state, &[KeyInput::Char('k'), KeyInput::Char('h')]);
        assert_eq!(state.grid.cursor(), Position::new(1, 0));
        keys(&mut state, &[KeyInput::Char('j'), KeyInput::Char('l'), KeyInput::Char('l'), KeyInput::Char('l')]);
        assert_eq!(state.grid.cursor(), Position::new(2, 2));
    }

    #[test]
    fn test_skip_without_snapshot_is_silent() {
        let mut state = fixtures::state();
        assert!(keys(&mut state, &[KeyInput::Char('n'), KeyInput::Char('p')]).is_empty());
        assert!(state.errors.is_empty());
    }

    #[test]
    fn test_skip_chains_follow_up_fetches() {
        let mut state = fixtures::state();
        state.currently_playing = Some(fixtures::playing(true));
        let effects = keys(&mut state, &[KeyInput::Char('n')]);
        assert!(matches!(calls(&effects)[..], [ApiCall::Skip(_)]));

        let effects = update(&mut state, Message::PlaybackUpdated(PlaybackCommand::Next));
        assert!(matches!(
            calls(&effects)[..],
            [ApiCall::CurrentlyPlaying(_), ApiCall::Queue]
        ));
    }

    #[test]
    fn test_pause_updates_snapshot_optimistically() {
        let mut state = fixtures::state();
        state.currently_playing = Some(fixtures::playing(true));
        update(&mut state, Message::PlaybackUpdated(PlaybackCommand::Pause));
        assert_eq!(state.is_playing(), Some(false));
    }

    #[test]
    fn test_playlist_selection_fetches_once_then_uses_cache() {
        let mut state = fixtures::state();
        update(
            &mut state,
            Message::PlaylistsLoaded(vec![fixtures::playlist("p1"), fixtures::playlist("p2")]),
        );
        // cursor to the playlists pane and focus it
        let effects = keys(&mut state, &[KeyInput::Right, KeyInput::Right, KeyInput::Enter, KeyInput::Enter]);
        assert!(matches!(
            &calls(&effects)[..],
            [ApiCall::PlaylistItems { playlist_id, .. }] if playlist_id == "p1"
        ));

        let items = vec![Playable::Track(fixtures::track("a"))];
        update(
            &mut state,
            Message::PlaylistItemsLoaded { playlist_id: "p1".into(), items: items.clone() },
        );
        assert_eq!(state.grid.pane(PaneId::PlaylistItems).unwrap().items.len(), 1);

        // away and back: served from the cache, no effect
        keys(&mut state, &[KeyInput::Down, KeyInput::Enter]);
        assert_eq!(state.shown_playlist.as_deref(), Some("p2"));
        let effects = keys(&mut state, &[KeyInput::Up, KeyInput::Enter]);
        assert!(effects.is_empty());
        assert_eq!(state.shown_playlist.as_deref(), Some("p1"));
    }

    #[test]
    fn test_cached_playlist_hit_is_synchronous() {
        let mut state = fixtures::state();
        state
            .playlist_items
            .insert("p1".into(), vec![Playable::Track(fixtures::track("a"))]);
        update(&mut state, Message::PlaylistsLoaded(vec![fixtures::playlist("p1")]));

        let effects = keys(&mut state, &[KeyInput::Right, KeyInput::Right, KeyInput::Enter, KeyInput::Enter]);
        assert!(effects.is_empty());
        assert_eq!(state.grid.pane(PaneId::PlaylistItems).unwrap().items.len(), 1);
    }

    #[test]
    fn test_late_playlist_items_do_not_clobber_current_view() {
        let mut state = fixtures::state();
        state.shown_playlist = Some("p2".into());
        update(
            &mut state,
            Message::PlaylistItemsLoaded {
                playlist_id: "p1".into(),
                items: vec![Playable::Track(fixtures::track("a"))],
            },
        );
        assert!(state.playlist_items.contains_key("p1"));
        assert!(state.grid.pane(PaneId::PlaylistItems).unwrap().items.is_empty());
    }

    #[test]
    fn test_device_selection_transfers_playback() {
        let mut state = fixtures::state();
        update(
            &mut state,
            Message::DevicesLoaded(vec![
                fixtures::device("d1", true, Some(20)),
                fixtures::device("d2", false, Some(20)),
            ]),
        );
        assert_eq!(state.active_device.as_ref().and_then(|d| d.id.as_deref()), Some("d1"));

        let effects = keys(&mut state, &[KeyInput::Down, KeyInput::Enter, KeyInput::Down, KeyInput::Enter]);
        assert!(matches!(
            &calls(&effects)[..],
            [ApiCall::Transfer { device_id }] if device_id == "d2"
        ));
        assert!(matches!(state.info, Some(Item::Device(_))));
    }

    #[test]
    fn test_queue_and_default_playlist_keys() {
        let mut state = fixtures::state();
        update(&mut state, Message::TopTracksLoaded(vec![fixtures::track("1")]));
        update(&mut state, Message::PlaylistsLoaded(vec![fixtures::playlist("p1")]));

        // tracks pane: queue it, then try the default playlist before one is set
        let effects = keys(&mut state, &[KeyInput::Right, KeyInput::Enter, KeyInput::Char('a')]);
        assert!(matches!(&calls(&effects)[..], [ApiCall::AddToQueue(p)] if p.uri == "spotify:track:1"));
        assert!(keys(&mut state, &[KeyInput::Char('s')]).is_empty());

        // mark p1 as default from the playlists pane
        keys(&mut state, &[KeyInput::Esc, KeyInput::Right, KeyInput::Enter, KeyInput::Char('d')]);
        assert_eq!(state.default_playlist.as_ref().map(|p| p.id.as_str()), Some("p1"));

        let effects = keys(&mut state, &[KeyInput::Esc, KeyInput::Left, KeyInput::Enter, KeyInput::Char('s')]);
        assert!(matches!(
            &calls(&effects)[..],
            [ApiCall::AddToPlaylist { playlist_id, uris }] if playlist_id == "p1" && uris[0] == "spotify:track:1"
        ));
    }

    #[test]
    fn test_media_pane_buttons() {
        let mut state = fixtures::state();
        state.currently_playing = Some(fixtures::playing(false));
        state.active_device = Some(fixtures::device("d1", true, Some(50)));

        // down twice reaches the controls row
        let effects = keys(
            &mut state,
            &[KeyInput::Down, KeyInput::Down, KeyInput::Enter, KeyInput::Right, KeyInput::Enter],
        );
        assert!(matches!(&calls(&effects)[..], [ApiCall::Resume(_)]));

        let effects = keys(&mut state, &[KeyInput::Right, KeyInput::Right, KeyInput::Right, KeyInput::Enter]);
        assert!(matches!(&calls(&effects)[..], [ApiCall::SetVolume(p)] if p.percent == 60));
    }

    #[test]
    fn test_token_renewal_cycle() {
        let mut state = fixtures::state();
        let tokens = TokenSet {
            access_token: "new".into(),
            refresh_token: "refresh".into(),
            expires_at: Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap(),
        };

        let effects = update(&mut state, Message::TokensRenewed(tokens.clone()));
        assert_eq!(state.credentials.tokens, tokens);
        assert_eq!(effects[0], Effect::PersistTokens(tokens.clone()));
        assert!(matches!(
            &effects[1],
            Effect::RenewTokens { at, auth } if *at == tokens.expires_at && auth.client_auth().is_ok()
        ));
        assert!(matches!(
            &effects[2],
            Effect::StartPolling { auth, .. } if auth.access_token().ok() == Some("new")
        ));
    }

    #[test]
    fn test_errors_are_logged_and_state_keeps_going() {
        let mut state = fixtures::state();
        update(&mut state, Message::AppErr("status: 500, message: boom".into()));
        update(&mut state, Message::QueueLoaded(Queue { currently_playing: None, queue: vec![] }));
        assert_eq!(state.errors.len(), 1);
        assert!(!state.should_quit);
    }

    #[test]
    fn test_polling_restarts_on_refresh_only_when_stopped() {
        let mut state = fixtures::state();
        init(&mut state);
        let effects = keys(&mut state, &[KeyInput::Char('r')]);
        assert!(!effects.iter().any(|e| matches!(e, Effect::StartPolling { .. })));

        update(&mut state, Message::PollingStopped);
        let effects = keys(&mut state, &[KeyInput::Char('r')]);
        assert!(effects.iter().any(|e| matches!(e, Effect::StartPolling { .. })));
    }
}
