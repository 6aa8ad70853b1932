//! Playlist-item resource types.
//!
//! A playlist item is the membership relation between a video and a
//! playlist; its id is distinct from the video's own id.

use crate::api::{PageInfo, Thumbnails};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Response structure for the `playlistItems.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistItemListResponse {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    #[serde(rename = "pageInfo")]
    pub page_info: Option<PageInfo>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `playlistItem` resource with its snippet decoded.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub id: String,
    pub snippet: PlaylistItemSnippet,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistItemSnippet {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnails: Thumbnails,
    #[serde(rename = "channelTitle")]
    pub channel_title: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Timestamp,
    /// Zero-based position within the playlist; the server's ordering is
    /// authoritative and not assumed contiguous.
    pub position: Option<u32>,
    #[serde(rename = "resourceId")]
    pub resource_id: PlaylistItemResourceId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistItemResourceId {
    #[serde(rename = "videoId")]
    pub video_id: String,
}

/// Listing with the snippet left as raw JSON.
///
/// The reorder path must write back every field it read, so it never decodes
/// the snippet into a narrower struct that would drop unknown fields.
#[derive(Debug, Serialize, Deserialize)]
pub struct RawPlaylistItemListResponse {
    #[serde(default)]
    pub items: Vec<RawPlaylistItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RawPlaylistItem {
    pub id: String,
    pub snippet: serde_json::Value,
}
