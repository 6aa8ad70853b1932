//! Channel resource types.

use crate::api::{PageInfo, Thumbnails};
use serde::{Deserialize, Serialize};

/// Response structure for the `channels.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelListResponse {
    /// Channels matching the request. Absent on the wire when empty.
    #[serde(default)]
    pub items: Vec<Channel>,
    #[serde(rename = "pageInfo")]
    pub page_info: Option<PageInfo>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `channel` resource. Which parts are populated depends on the `part`
/// selector of the request that produced it.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub snippet: Option<ChannelSnippet>,
    pub statistics: Option<ChannelStatistics>,
    #[serde(rename = "contentDetails")]
    pub content_details: Option<ChannelContentDetails>,
}

/// Basic channel details.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#snippet>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelSnippet {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

/// Channel statistics. Counts arrive as decimal strings on the wire.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#statistics>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelStatistics {
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: Option<String>,
    #[serde(rename = "videoCount")]
    pub video_count: Option<String>,
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
}

/// Links a channel to its canonical playlists, notably the uploads feed.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#contentDetails>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelContentDetails {
    #[serde(rename = "relatedPlaylists")]
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RelatedPlaylists {
    /// The playlist listing everything the channel has published. Absent for
    /// channels that have never uploaded.
    pub uploads: Option<String>,
}
