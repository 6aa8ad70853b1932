//! Playlist resource types.

use crate::api::{PageInfo, Thumbnails};
use serde::{Deserialize, Serialize};

/// Response structure for the `playlists.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistListResponse {
    #[serde(default)]
    pub items: Vec<Playlist>,
    #[serde(rename = "pageInfo")]
    pub page_info: Option<PageInfo>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `playlist` resource. Also the shape of a successful `playlists.insert`
/// response.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub snippet: PlaylistSnippet,
    #[serde(rename = "contentDetails")]
    pub content_details: Option<PlaylistContentDetails>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistSnippet {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistContentDetails {
    #[serde(rename = "itemCount")]
    pub item_count: u32,
}
