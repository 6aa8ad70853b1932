//! Subscription resource types.

use crate::api::{PageInfo, Thumbnails};
use serde::{Deserialize, Serialize};

/// Response structure for the `subscriptions.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/subscriptions/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionListResponse {
    #[serde(default)]
    pub items: Vec<Subscription>,
    #[serde(rename = "pageInfo")]
    pub page_info: Option<PageInfo>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `subscription` resource: the authenticated user following a channel.
///
/// See: <https://developers.google.com/youtube/v3/docs/subscriptions#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Subscription {
    pub snippet: SubscriptionSnippet,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionSnippet {
    /// Title of the subscribed-to channel.
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnails: Thumbnails,
    #[serde(rename = "resourceId")]
    pub resource_id: SubscriptionResourceId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionResourceId {
    #[serde(rename = "channelId")]
    pub channel_id: String,
}
