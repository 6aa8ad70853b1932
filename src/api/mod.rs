//! Serde projections of the external REST resources consumed by the core.
//!
//! Each file models one resource, keeping only the fields this crate reads.
//! Field names follow the wire format via `#[serde(rename)]`.

pub mod channels;
pub mod playlist_items;
pub mod playlists;
pub mod subscriptions;
pub mod videos;

use serde::{Deserialize, Serialize};

/// Paging details for lists of resources.
///
/// See: <https://developers.google.com/youtube/v3/docs/pageInfo>
#[derive(Debug, Serialize, Deserialize)]
pub struct PageInfo {
    /// The total number of results in the result set.
    #[serde(rename = "totalResults")]
    pub total_results: u32,
    /// The number of results included in the API response.
    #[serde(rename = "resultsPerPage")]
    pub results_per_page: u32,
}

/// Thumbnail images keyed by size.
///
/// See: <https://developers.google.com/youtube/v3/docs/thumbnails>
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}
