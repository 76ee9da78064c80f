use std::cell::RefCell;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use ureq::Agent;
use urlencoding::encode;

use crate::config::Config;
use crate::models::{PlaylistInfo, TokenResponse, TracksPage};
use crate::tracker::MetadataProvider;

const API_BASE: &str = "https://api.spotify.com/v1";
const ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

/// Largest page the tracks endpoint serves
const PAGE_LIMIT: u32 = 100;

const PLAYLIST_FIELDS: &str = "name,owner(display_name),followers(total)";
const TRACK_FIELDS: &str = "items(track(id,name,artists(name),album(name,release_date),popularity,duration_ms,preview_url,external_urls(spotify))),next";

/// Refresh the token this long before the provider says it expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// A minimal Spotify Web API client using the client-credentials grant
pub struct SpotifyClient {
    agent: Agent,
    api_base: String,
    accounts_base: String,
    client_id: String,
    client_secret: String,
    token: RefCell<Option<AccessToken>>,
}

impl SpotifyClient {
    pub fn new(config: &Config) -> Self {
        SpotifyClient {
            agent: Agent::new(),
            api_base: API_BASE.to_string(),
            accounts_base: ACCOUNTS_BASE.to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token: RefCell::new(None),
        }
    }

    /// Return a valid bearer token, requesting a new one when the cached one is stale
    fn bearer_token(&self) -> Result<String> {
        if let Some(token) = self.token.borrow().as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        log::debug!("Requesting new access token");
        let url = format!("{}/api/token", self.accounts_base.trim_end_matches('/'));
        let response: TokenResponse = self
            .agent
            .post(&url)
            .set(
                "Authorization",
                &basic_auth_header(&self.client_id, &self.client_secret),
            )
            .send_form(&[("grant_type", "client_credentials")])
            .map_err(describe_http_error)
            .context("Token request failed")?
            .into_json()
            .context("Failed to parse token response")?;

        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        let value = response.access_token;
        *self.token.borrow_mut() = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    /// Authenticated GET decoding a JSON body
    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let token = self.bearer_token()?;
        let response = self
            .agent
            .get(url)
            .set("Authorization", &format!("Bearer {token}"))
            .call()
            .map_err(describe_http_error)
            .with_context(|| format!("HTTP request failed: {url}"))?;

        response
            .into_json()
            .with_context(|| format!("Failed to parse JSON response from {url}"))
    }

    fn first_tracks_page_url(&self, playlist_id: &str) -> String {
        format!(
            "{}/playlists/{}/tracks?limit={}&fields={}",
            self.api_base.trim_end_matches('/'),
            encode(playlist_id),
            PAGE_LIMIT,
            encode(TRACK_FIELDS)
        )
    }

    fn playlist_url(&self, playlist_id: &str) -> String {
        format!(
            "{}/playlists/{}?fields={}",
            self.api_base.trim_end_matches('/'),
            encode(playlist_id),
            encode(PLAYLIST_FIELDS)
        )
    }
}

impl MetadataProvider for SpotifyClient {
    fn get_playlist(&self, playlist_id: &str) -> Result<PlaylistInfo> {
        self.get_json(&self.playlist_url(playlist_id))
    }

    fn get_tracks_page(&self, playlist_id: &str, cursor: Option<String>) -> Result<TracksPage> {
        // The provider's `next` link already carries offset, limit and fields
        let url = cursor.unwrap_or_else(|| self.first_tracks_page_url(playlist_id));
        self.get_json(&url)
    }
}

/// `Authorization` header value for HTTP Basic auth
fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{client_id}:{client_secret}")))
}

/// Keep the status line and body of HTTP error responses in the error message
fn describe_http_error(err: ureq::Error) -> anyhow::Error {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            anyhow::anyhow!("HTTP status {code}: {}", body.trim())
        }
        other => anyhow::Error::new(other),
    }
}

/// Extract the playlist id from a share URL, URI, or bare id
pub fn playlist_id_from_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
    last.split('?').next().unwrap_or(last).to_string()
}
