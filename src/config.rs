use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Playlist tracked when neither `--playlist` nor `PLAYLIST_URL` is given
pub const DEFAULT_PLAYLIST_URL: &str = "https://open.spotify.com/playlist/4fdUWePS7vpy3r1GiZtv1L";

const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub playlist_url: String,
    pub data_dir: PathBuf,
    pub cache_ttl: Duration,
}

/// Load configuration from `.env` and environment
pub fn load_config() -> Result<Config> {
    // Load `.env` file if present
    dotenv::dotenv().ok();
    Config::from_lookup(|key| std::env::var(key).ok())
}

impl Config {
    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("missing required environment variable {key}"))
        };

        let client_id = required("SPOTIFY_CLIENT_ID")?;
        let client_secret = required("SPOTIFY_CLIENT_SECRET")?;
        let playlist_url =
            lookup("PLAYLIST_URL").unwrap_or_else(|| DEFAULT_PLAYLIST_URL.to_string());
        let data_dir = lookup("TRACKER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let cache_ttl = match lookup("CACHE_TTL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("CACHE_TTL_SECS must be a number of seconds, got '{raw}'"))?,
            None => DEFAULT_CACHE_TTL_SECS,
        };

        Ok(Config {
            client_id,
            client_secret,
            playlist_url,
            data_dir,
            cache_ttl: Duration::from_secs(cache_ttl),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.playlist_url, DEFAULT_PLAYLIST_URL);
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
            ("PLAYLIST_URL", "37i9dQZF1DX0XUsuxWHRQd"),
            ("TRACKER_DATA_DIR", "/var/lib/tracker"),
            ("CACHE_TTL_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.playlist_url, "37i9dQZF1DX0XUsuxWHRQd");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/tracker"));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_missing_credentials() {
        let err = Config::from_lookup(lookup_from(&[("SPOTIFY_CLIENT_ID", "id")])).unwrap_err();
        assert!(err.to_string().contains("SPOTIFY_CLIENT_SECRET"));

        let err = Config::from_lookup(lookup_from(&[
            ("SPOTIFY_CLIENT_ID", "  "),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SPOTIFY_CLIENT_ID"));
    }

    #[test]
    fn test_bad_ttl() {
        let result = Config::from_lookup(lookup_from(&[
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
            ("CACHE_TTL_SECS", "an hour"),
        ]));
        assert!(result.is_err());
    }
}
