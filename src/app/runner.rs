// Effect runner - does the async work the reducer asks for and reports every
// outcome back through the message queue. Never touches AppState.

use std::ops::ControlFlow;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use super::effects::{ApiCall, ApiRequest, Effect};
use super::message::{Message, PlaybackCommand};
use super::tasks::{DelayedTask, RepeatingTask};
use crate::spotify::params::{DeviceParams, SkipDirection};
use crate::spotify::types::{AddItemsToPlaylist, StartPlayback, TransferPlayback};
use crate::spotify::{ApiError, Refresher, SpotifyClient};
use crate::store::CredentialStore;

pub struct EffectRunner {
    client: SpotifyClient,
    refresher: Refresher,
    store: Option<CredentialStore>,
    tx: UnboundedSender<Message>,
    poller: Option<RepeatingTask>,
    renewal: Option<DelayedTask>,
}

impl EffectRunner {
    pub fn new(
        client: SpotifyClient,
        refresher: Refresher,
        store: CredentialStore,
        tx: UnboundedSender<Message>,
    ) -> Self {
        Self {
            client,
            refresher,
            store: Some(store),
            tx,
            poller: None,
            renewal: None,
        }
    }

    /// Starts `effect`. Requests run concurrently and answer whenever they
    /// finish; persistence and shutdown complete before this returns.
    pub fn run(&mut self, effect: Effect) {
        match effect {
            Effect::Request(request) => {
                let client = self.client.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(execute(&client, request).await);
                });
            }
            Effect::PersistTokens(tokens) => {
                let msg = match &self.store {
                    Some(store) => match store.update_tokens(&tokens) {
                        Ok(()) => Message::TokensPersisted,
                        Err(e) => {
                            error!("failed to persist tokens: {e}");
                            Message::AppErr(format!("failed to persist tokens: {e}"))
                        }
                    },
                    None => Message::AppErr("credential store already closed".into()),
                };
                let _ = self.tx.send(msg);
            }
            Effect::RenewTokens { auth, at } => {
                let delay = (at - Utc::now()).to_std().unwrap_or_default();
                debug!(?delay, "token renewal scheduled");
                let refresher = self.refresher.clone();
                let tx = self.tx.clone();
                // replacing the handle cancels the previous timer
                self.renewal = Some(DelayedTask::spawn(delay, async move {
                    let msg = match refresher.refresh(&auth, Utc::now()).await {
                        Ok(tokens) => Message::TokensRenewed(tokens),
                        Err(e) => {
                            warn!("token renewal failed: {e}");
                            Message::AppErr(format!("token renewal failed: {e}"))
                        }
                    };
                    let _ = tx.send(msg);
                }));
            }
            Effect::StartPolling { auth, every, market } => {
                let client = self.client.clone();
                let tx = self.tx.clone();
                debug!(?every, "currently-playing poller started");
                self.poller = Some(RepeatingTask::spawn(every, move || {
                    let client = client.clone();
                    let tx = tx.clone();
                    let auth = auth.clone();
                    let market = market.clone();
                    async move {
                        match client.currently_playing(&auth, &market).await {
                            Ok(snapshot) => {
                                let _ = tx.send(Message::CurrentlyPlayingLoaded(Some(snapshot)));
                                ControlFlow::Continue(())
                            }
                            Err(ApiError::NoContent) => {
                                let _ = tx.send(Message::CurrentlyPlayingLoaded(None));
                                ControlFlow::Continue(())
                            }
                            Err(e) => {
                                warn!("polling stopped: {e}");
                                let _ = tx.send(Message::AppErr(e.to_string()));
                                let _ = tx.send(Message::PollingStopped);
                                ControlFlow::Break(())
                            }
                        }
                    }
                }));
            }
            Effect::Shutdown => {
                self.poller = None;
                self.renewal = None;
                if let Some(store) = self.store.take() {
                    if let Err(e) = store.close() {
                        error!("failed to close credential store: {e}");
                    }
                }
                info!("shutting down");
                let _ = self.tx.send(Message::Shutdown);
            }
        }
    }
}

/// One request, one message. Errors come back as `AppErr` carrying the
/// remote's status and body.
pub async fn execute(client: &SpotifyClient, request: ApiRequest) -> Message {
    let ApiRequest { auth, call } = request;
    let result = match call {
        ApiCall::Profile => client.current_user(&auth).await.map(Message::ProfileLoaded),
        ApiCall::TopArtists(params) => client
            .top_artists(&auth, &params)
            .await
            .map(|page| Message::TopArtistsLoaded(page.items)),
        ApiCall::TopTracks(params) => client
            .top_tracks(&auth, &params)
            .await
            .map(|page| Message::TopTracksLoaded(page.items)),
        ApiCall::Playlists(params) => client
            .current_user_playlists(&auth, &params)
            .await
            .map(|page| Message::PlaylistsLoaded(page.items)),
        ApiCall::PlaylistItems { playlist_id, params } => client
            .playlist_items(&auth, &playlist_id, &params)
            .await
            .map(|page| Message::PlaylistItemsLoaded {
                items: page.items.into_iter().filter_map(|i| i.track).collect(),
                playlist_id,
            }),
        ApiCall::ArtistTopTracks { artist_id, market } => client
            .artist_top_tracks(&auth, &artist_id, &market)
            .await
            .map(|top| Message::ArtistTopTracksLoaded {
                tracks: top.tracks,
                artist_id,
            }),
        ApiCall::Devices => client
            .devices(&auth)
            .await
            .map(|d| Message::DevicesLoaded(d.devices)),
        ApiCall::CurrentlyPlaying(market) => match client.currently_playing(&auth, &market).await {
            Err(ApiError::NoContent) => Ok(Message::CurrentlyPlayingLoaded(None)),
            other => other.map(|snapshot| Message::CurrentlyPlayingLoaded(Some(snapshot))),
        },
        ApiCall::Queue => client.queue(&auth).await.map(Message::QueueLoaded),
        ApiCall::RecentlyPlayed(params) => client
            .recently_played(&auth, &params)
            .await
            .map(|recent| Message::RecentlyPlayedLoaded(recent.items)),

        ApiCall::Resume(device) => client
            .start_playback(&auth, &device, &StartPlayback::default())
            .await
            .map(|()| Message::PlaybackUpdated(PlaybackCommand::Resume)),
        ApiCall::PlayUri { device, uri } => play_uri(client, &auth, &device, uri).await,
        ApiCall::Pause(device) => client
            .pause(&auth, &device)
            .await
            .map(|()| Message::PlaybackUpdated(PlaybackCommand::Pause)),
        ApiCall::Skip(params) => client.skip(&auth, &params).await.map(|()| {
            Message::PlaybackUpdated(match params.direction {
                SkipDirection::Next => PlaybackCommand::Next,
                SkipDirection::Previous => PlaybackCommand::Previous,
            })
        }),
        ApiCall::SetVolume(params) => client
            .set_volume(&auth, &params)
            .await
            .map(|()| Message::PlaybackUpdated(PlaybackCommand::Volume(params.percent))),
        ApiCall::AddToQueue(params) => client
            .add_to_queue(&auth, &params)
            .await
            .map(|()| Message::PlaybackUpdated(PlaybackCommand::Queued(params.uri))),
        ApiCall::Transfer { device_id } => {
            let body = TransferPlayback {
                device_ids: vec![device_id.clone()],
                play: true,
            };
            client
                .transfer_playback(&auth, &body)
                .await
                .map(|()| Message::PlaybackUpdated(PlaybackCommand::Transferred(device_id)))
        }
        ApiCall::AddToPlaylist { playlist_id, uris } => {
            let body = AddItemsToPlaylist { uris, position: None };
            client
                .add_items_to_playlist(&auth, &playlist_id, &body)
                .await
                .map(|snapshot| Message::PlaylistItemsAdded {
                    playlist_id,
                    snapshot_id: snapshot.snapshot_id,
                })
        }
    };

    result.unwrap_or_else(|e| {
        warn!("request failed: {e}");
        Message::AppErr(e.to_string())
    })
}

async fn play_uri(
    client: &SpotifyClient,
    auth: &crate::spotify::RequestAuth,
    device: &DeviceParams,
    uri: String,
) -> Result<Message, ApiError> {
    let body = StartPlayback {
        uris: Some(vec![uri.clone()]),
        ..Default::default()
    };
    client.start_playback(auth, device, &body).await?;
    Ok(Message::PlaybackUpdated(PlaybackCommand::PlayUri(uri)))
}
