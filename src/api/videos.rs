//! Video resource types, used for the batched detail-enrichment call.

use crate::api::PageInfo;
use serde::{Deserialize, Serialize};

/// Response structure for the `videos.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<Video>,
    #[serde(rename = "pageInfo")]
    pub page_info: Option<PageInfo>,
}

/// A `video` resource, requested with `part=contentDetails,statistics`.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    #[serde(rename = "contentDetails")]
    pub content_details: Option<VideoContentDetails>,
    pub statistics: Option<VideoStatistics>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VideoContentDetails {
    /// The video length as an ISO 8601 duration (e.g. `PT4M13S`).
    pub duration: Option<String>,
}

/// See: <https://developers.google.com/youtube/v3/docs/videos#statistics>
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoStatistics {
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
}
