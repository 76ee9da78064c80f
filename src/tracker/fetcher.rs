use anyhow::{Context, Result};

use super::normalizer::normalize_all;
use crate::models::{PlaylistInfo, PlaylistSnapshot, RawTrackItem, TracksPage};

/// Remote source of playlist metadata and paginated track listings
#[cfg_attr(test, mockall::automock)]
pub trait MetadataProvider {
    fn get_playlist(&self, playlist_id: &str) -> Result<PlaylistInfo>;

    /// Fetch one page of tracks. `None` requests the first page; otherwise
    /// `cursor` is the `next` pointer of the previous page.
    fn get_tracks_page(&self, playlist_id: &str, cursor: Option<String>) -> Result<TracksPage>;
}

/// Drain every page of the playlist's track collection, in provider order.
/// A failed page aborts the whole fetch.
pub fn fetch_all_tracks<P>(provider: &P, playlist_id: &str) -> Result<Vec<RawTrackItem>>
where
    P: MetadataProvider + ?Sized,
{
    let mut items = Vec::new();
    let mut cursor = None;
    let mut page_number = 0;

    loop {
        page_number += 1;
        let page = provider
            .get_tracks_page(playlist_id, cursor)
            .with_context(|| format!("Failed to fetch tracks page {page_number}"))?;

        log::debug!(
            "Page {}: {} items (total: {})",
            page_number,
            page.items.len(),
            items.len() + page.items.len()
        );
        items.extend(page.items);

        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(items)
}

/// Fetch playlist metadata and all tracks, normalized into a snapshot
pub fn fetch_snapshot<P>(provider: &P, playlist_id: &str) -> Result<PlaylistSnapshot>
where
    P: MetadataProvider + ?Sized,
{
    let info = provider
        .get_playlist(playlist_id)
        .with_context(|| format!("Failed to fetch playlist {playlist_id}"))?;
    let raw_items = fetch_all_tracks(provider, playlist_id)?;
    let raw_count = raw_items.len();
    let tracks = normalize_all(&raw_items);

    if tracks.len() < raw_count {
        log::info!(
            "Skipped {} unavailable tracks in '{}'",
            raw_count - tracks.len(),
            info.name
        );
    }

    Ok(PlaylistSnapshot {
        id: playlist_id.to_string(),
        name: info.name,
        owner_display_name: info.owner.display_name.unwrap_or_default(),
        follower_count: info.followers.total,
        tracks,
    })
}
