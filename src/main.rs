use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

mod client;
mod config;
mod models;
mod report;
mod tracker;

#[cfg(test)]
mod tracker_tests;

use crate::client::{SpotifyClient, playlist_id_from_url};
use crate::config::load_config;
use crate::tracker::{HistoricalStore, PlaylistTracker, SystemClock};

#[derive(Parser)]
#[command(name = "playlist-tracker")]
#[command(about = "Daily growth and popularity tracking for a Spotify playlist")]
#[command(version)]
struct Args {
    /// Playlist share URL, URI or id (overrides PLAYLIST_URL)
    #[arg(short = 'p', long = "playlist")]
    playlist: Option<String>,

    /// Directory holding the history CSV files (overrides TRACKER_DATA_DIR)
    #[arg(short = 'd', long = "data-dir")]
    data_dir: Option<PathBuf>,

    /// Number of tracks and artists listed in the rankings
    #[arg(short = 't', long = "top", default_value_t = 20)]
    top: usize,

    /// Keep running and refresh every SECS seconds
    #[arg(short = 'w', long = "watch", value_name = "SECS")]
    watch: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only record stats, print no report
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match (args.quiet, args.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load configuration from .env
    let config = load_config().context(
        "Failed to load configuration. Set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET in the environment or .env",
    )?;

    let playlist_url = args.playlist.clone().unwrap_or_else(|| config.playlist_url.clone());
    let playlist_id = playlist_id_from_url(&playlist_url);
    if playlist_id.is_empty() {
        anyhow::bail!("Could not extract a playlist id from '{playlist_url}'");
    }

    let data_dir = args.data_dir.clone().unwrap_or_else(|| config.data_dir.clone());
    let store = HistoricalStore::new(&data_dir);
    log::info!(
        "History files: {} and {}",
        store.playlist_path().display(),
        store.track_path().display()
    );

    let client = SpotifyClient::new(&config);
    let mut tracker = PlaylistTracker::new(
        client,
        store,
        SystemClock,
        config.cache_ttl,
    );

    let Some(interval) = args.watch else {
        let dashboard = tracker
            .refresh(&playlist_id)
            .context("Failed to fetch playlist data")?;
        if !args.quiet {
            print!("{}", report::render(&dashboard, args.top));
        }
        return Ok(());
    };

    log::info!("Refreshing every {interval}s");
    loop {
        match tracker.refresh(&playlist_id) {
            Ok(dashboard) => {
                if !args.quiet {
                    println!("{}", report::render(&dashboard, args.top));
                }
            }
            // Keep the loop alive; the next refresh retries from scratch
            Err(e) => log::error!("Failed to fetch playlist data: {e:#}"),
        }
        std::thread::sleep(Duration::from_secs(interval.max(1)));
    }
}
