//! Maps follow-up for local intent.
//!
//! Runs when the merged primary result showed a local pack, or
//! unconditionally under forced local intent. Geography is pinned by
//! preference: coordinates recovered from the provider's maps URL win
//! over the configured location string, never both. Maps pages paginate
//! through the same cursor loop as the primary call, and the maps
//! places are folded onto the main-pack places with place-identity
//! deduplication, pack entries first.

use crate::config::AcquireConfig;
use crate::merge::{PageMerger, SerpAccumulator};
use crate::params::CallParams;
use crate::retry::{RetryClient, Sleeper};
use crate::transport::SerpTransport;
use crate::types::{MergedSerp, Place};
use std::time::Duration;
use url::Url;

/// Combined place list and the number of maps pages it took.
#[derive(Debug, Default)]
pub struct LocalOutcome {
    /// Main-pack places first, then maps places, deduplicated by place
    /// identity.
    pub places: Vec<Place>,
    pub pages_fetched: usize,
}

/// Recover a `lat,long` pair from a maps URL's `ll` parameter.
///
/// Both components must parse as finite floats; anything else is
/// treated as no coordinates.
pub fn extract_latlong(maps_url: &str) -> Option<String> {
    let parsed = Url::parse(maps_url).ok()?;
    let ll = parsed
        .query_pairs()
        .find(|(key, _)| key == "ll")
        .map(|(_, value)| value.into_owned())?;
    let trimmed = ll.trim_start_matches('@');
    let mut parts = trimmed.split(',');
    let lat = parts.next()?;
    let long = parts.next()?;
    if !lat.parse::<f64>().map(f64::is_finite).unwrap_or(false)
        || !long.parse::<f64>().map(f64::is_finite).unwrap_or(false)
    {
        return None;
    }
    Some(format!("{lat},{long}"))
}

/// Run the maps follow-up if local intent warrants it.
///
/// Returns `None` when the gate does not fire. A failed first maps call
/// degrades to the main-pack places with zero maps pages.
pub async fn resolve_local_results<T: SerpTransport, S: Sleeper>(
    client: &RetryClient<T, S>,
    sleeper: &S,
    merged: &MergedSerp,
    query: &str,
    config: &AcquireConfig,
) -> Option<LocalOutcome> {
    if !merged.has_local_pack() && !config.force_local_intent {
        return None;
    }

    let mut params = CallParams::new("google_maps")
        .with("q", query)
        .with("type", "search")
        .with("hl", config.hl.as_str())
        .with("gl", config.gl.as_str())
        .with("no_cache", "true");

    match merged.maps_url.as_deref().and_then(extract_latlong) {
        Some(latlong) => {
            tracing::debug!(ll = %latlong, "pinning maps call to recovered coordinates");
            params = params.with("ll", latlong);
        }
        None => {
            // Zoom is required when pinning by named location.
            params = params
                .with("location", config.location.as_str())
                .with("z", config.maps_zoom.as_str());
        }
    }

    let first_page = match client.execute(&params).await {
        Ok(page) => page,
        Err(err) => {
            tracing::warn!(error = %err, "maps call failed; keeping main-pack places");
            return Some(LocalOutcome {
                places: merged.local_places.clone(),
                pages_fetched: 0,
            });
        }
    };

    let merger = PageMerger::new(config.max_pages, usize::MAX);
    let delay = Duration::from_millis(config.inter_page_delay_ms);
    let maps_merged = merger
        .merge(first_page, |cursor| {
            let next_params = params.clone().with("start", cursor);
            async move {
                sleeper.sleep(delay).await;
                match client.execute(&next_params).await {
                    Ok(page) => Some(page),
                    Err(err) => {
                        tracing::warn!(error = %err, "maps page fetch failed; stopping");
                        None
                    }
                }
            }
        })
        .await;

    let mut acc = SerpAccumulator::new();
    acc.absorb_places(&merged.local_places);
    acc.absorb_places(&maps_merged.local_places);
    Some(LocalOutcome {
        places: acc.finish().local_places,
        pages_fetched: maps_merged.pages_fetched,
    })
}
