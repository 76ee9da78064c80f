use crate::models::{RawTrackItem, ReleaseDate, Track};

/// Map a raw playlist entry to a track row, or `None` when the entry has no
/// underlying track (removed or unavailable).
pub fn normalize(item: &RawTrackItem) -> Option<Track> {
    let track = item.track.as_ref()?;

    let artist = track
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let release_date = track.album.release_date.as_deref().and_then(|raw| {
        raw.parse::<ReleaseDate>()
            .map_err(|e| log::debug!("Unparseable release date '{raw}' on '{}': {e}", track.name))
            .ok()
    });

    Some(Track {
        id: track.id.clone().unwrap_or_default(),
        name: track.name.clone(),
        artist,
        album: track.album.name.clone(),
        popularity: track.popularity,
        duration_ms: track.duration_ms,
        release_date,
        preview_url: track.preview_url.clone(),
        external_url: track.external_urls.spotify.clone(),
    })
}

/// Normalize a whole listing, keeping the order of the surviving tracks
pub fn normalize_all(items: &[RawTrackItem]) -> Vec<Track> {
    items.iter().filter_map(normalize).collect()
}
