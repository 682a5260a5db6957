// Remote API client - thin request builders over one shared reqwest::Client
// Holds no tokens; every call gets its credentials through a RequestAuth

use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use super::params::{
    DeviceParams, MarketParams, NoParams, PageParams, PlaylistItemsParams, QueryParams,
    QueueParams, RecentlyPlayedParams, SkipParams, TopItemsParams, VolumeParams,
};
use super::types::{
    AddItemsToPlaylist, Artist, ArtistTopTracks, CurrentlyPlaying, Devices, Page, PlaylistItem,
    PlaylistSnapshot, Queue, RecentlyPlayed, SimplifiedPlaylist, StartPlayback, Track,
    TransferPlayback, User,
};
use super::{ApiError, RequestAuth, TokenResponse};

const ACCOUNTS_BASE: &str = "https://accounts.spotify.com";
const API_BASE: &str = "https://api.spotify.com/v1";

/// Where requests go. Overridable so tests can point everything at a local server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub authorize: String,
    pub token: String,
    pub api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            authorize: format!("{ACCOUNTS_BASE}/authorize"),
            token: format!("{ACCOUNTS_BASE}/api/token"),
            api: API_BASE.to_string(),
        }
    }
}

impl Endpoints {
    /// Same layout as the real service, rooted somewhere else.
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorize: format!("{base}/authorize"),
            token: format!("{base}/api/token"),
            api: format!("{base}/v1"),
        }
    }
}

/// Maps a finished response onto the expected type.
///
/// 200 (and 201 from the create-style playlist endpoint) decode the body,
/// 204 is `NoContent`, anything else keeps the status and the raw body text.
pub fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    check_status(status, body)?;
    Ok(serde_json::from_str(body)?)
}

/// Status check for calls that expect no body back.
pub fn check_status(status: StatusCode, body: &str) -> Result<(), ApiError> {
    match status {
        StatusCode::OK | StatusCode::CREATED => Ok(()),
        StatusCode::NO_CONTENT => Err(ApiError::NoContent),
        other => Err(ApiError::Remote {
            status: other.as_u16(),
            body: body.to_string(),
        }),
    }
}

/// Player commands answer 204 on success.
fn accept_no_content(result: Result<(), ApiError>) -> Result<(), ApiError> {
    match result {
        Err(ApiError::NoContent) => Ok(()),
        other => other,
    }
}

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl SpotifyClient {
    pub fn new(endpoints: Endpoints) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("gridtunes/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn api_url(&self, segments: &[&str], params: &impl QueryParams) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.endpoints.api)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        params.apply(&mut url);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        auth: &RequestAuth,
        body: Option<serde_json::Value>,
    ) -> Result<(StatusCode, String), ApiError> {
        let token = auth.access_token()?;
        debug!(%method, path = url.path(), "api request");

        let bodiless_write = body.is_none() && method != Method::GET;
        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(json) = body {
            request = request.json(&json);
        } else if bodiless_write {
            // player endpoints reject a bodiless PUT/POST without a length
            request = request.header(header::CONTENT_LENGTH, 0);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "api request rejected");
        }
        Ok((status, text))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        auth: &RequestAuth,
        segments: &[&str],
        params: &impl QueryParams,
    ) -> Result<T, ApiError> {
        let url = self.api_url(segments, params)?;
        let (status, body) = self.send(Method::GET, url, auth, None).await?;
        decode_response(status, &body)
    }

    async fn command<B: Serialize>(
        &self,
        method: Method,
        auth: &RequestAuth,
        segments: &[&str],
        params: &impl QueryParams,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let url = self.api_url(segments, params)?;
        let body = body.map(serde_json::to_value).transpose()?;
        let (status, text) = self.send(method, url, auth, body).await?;
        accept_no_content(check_status(status, &text))
    }

    pub async fn current_user(&self, auth: &RequestAuth) -> Result<User, ApiError> {
        self.get(auth, &["me"], &NoParams).await
    }

    pub async fn top_artists(
        &self,
        auth: &RequestAuth,
        params: &TopItemsParams,
    ) -> Result<Page<Artist>, ApiError> {
        self.get(auth, &["me", "top", "artists"], params).await
    }

    pub async fn top_tracks(
        &self,
        auth: &RequestAuth,
        params: &TopItemsParams,
    ) -> Result<Page<Track>, ApiError> {
        self.get(auth, &["me", "top", "tracks"], params).await
    }

    pub async fn current_user_playlists(
        &self,
        auth: &RequestAuth,
        params: &PageParams,
    ) -> Result<Page<SimplifiedPlaylist>, ApiError> {
        self.get(auth, &["me", "playlists"], params).await
    }

    pub async fn playlist_items(
        &self,
        auth: &RequestAuth,
        playlist_id: &str,
        params: &PlaylistItemsParams,
    ) -> Result<Page<PlaylistItem>, ApiError> {
        self.get(auth, &["playlists", playlist_id, "tracks"], params).await
    }

    pub async fn add_items_to_playlist(
        &self,
        auth: &RequestAuth,
        playlist_id: &str,
        body: &AddItemsToPlaylist,
    ) -> Result<PlaylistSnapshot, ApiError> {
        let url = self.api_url(&["playlists", playlist_id, "tracks"], &NoParams)?;
        let body = serde_json::to_value(body)?;
        let (status, text) = self.send(Method::POST, url, auth, Some(body)).await?;
        decode_response(status, &text)
    }

    pub async fn artist_top_tracks(
        &self,
        auth: &RequestAuth,
        artist_id: &str,
        params: &MarketParams,
    ) -> Result<ArtistTopTracks, ApiError> {
        self.get(auth, &["artists", artist_id, "top-tracks"], params).await
    }

    pub async fn devices(&self, auth: &RequestAuth) -> Result<Devices, ApiError> {
        self.get(auth, &["me", "player", "devices"], &NoParams).await
    }

    /// Full player state, device included. `NoContent` when nothing is active.
    pub async fn playback_state(
        &self,
        auth: &RequestAuth,
        params: &MarketParams,
    ) -> Result<CurrentlyPlaying, ApiError> {
        self.get(auth, &["me", "player"], params).await
    }

    pub async fn currently_playing(
        &self,
        auth: &RequestAuth,
        params: &MarketParams,
    ) -> Result<CurrentlyPlaying, ApiError> {
        self.get(auth, &["me", "player", "currently-playing"], params).await
    }

    pub async fn queue(&self, auth: &RequestAuth) -> Result<Queue, ApiError> {
        self.get(auth, &["me", "player", "queue"], &NoParams).await
    }

    pub async fn recently_played(
        &self,
        auth: &RequestAuth,
        params: &RecentlyPlayedParams,
    ) -> Result<RecentlyPlayed, ApiError> {
        self.get(auth, &["me", "player", "recently-played"], params).await
    }

    pub async fn start_playback(
        &self,
        auth: &RequestAuth,
        device: &DeviceParams,
        body: &StartPlayback,
    ) -> Result<(), ApiError> {
        self.command(Method::PUT, auth, &["me", "player", "play"], device, Some(body))
            .await
    }

    pub async fn pause(&self, auth: &RequestAuth, device: &DeviceParams) -> Result<(), ApiError> {
        self.command::<()>(Method::PUT, auth, &["me", "player", "pause"], device, None)
            .await
    }

    pub async fn skip(&self, auth: &RequestAuth, params: &SkipParams) -> Result<(), ApiError> {
        let segments = ["me", "player", params.direction.endpoint()];
        self.command::<()>(Method::POST, auth, &segments, params, None).await
    }

    pub async fn set_volume(&self, auth: &RequestAuth, params: &VolumeParams) -> Result<(), ApiError> {
        self.command::<()>(Method::PUT, auth, &["me", "player", "volume"], params, None)
            .await
    }

    pub async fn add_to_queue(&self, auth: &RequestAuth, params: &QueueParams) -> Result<(), ApiError> {
        self.command::<()>(Method::POST, auth, &["me", "player", "queue"], params, None)
            .await
    }

    pub async fn transfer_playback(
        &self,
        auth: &RequestAuth,
        body: &TransferPlayback,
    ) -> Result<(), ApiError> {
        self.command(Method::PUT, auth, &["me", "player"], &NoParams, Some(body))
            .await
    }

    /// POSTs a grant to the token endpoint. Basic auth only, never a bearer.
    pub async fn request_token(
        &self,
        basic_header: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, ApiError> {
        let url = Url::parse(&self.endpoints.token)?;
        debug!(grant = ?form.iter().find(|(k, _)| *k == "grant_type").map(|(_, v)| *v), "token request");

        let response = self
            .http
            .post(url)
            .header(header::AUTHORIZATION, basic_header)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        decode_response(status, &text)
    }
}
