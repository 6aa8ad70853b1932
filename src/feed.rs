//! Multi-channel feed aggregation: the user's profile, their subscriptions,
//! and recent uploads per channel, each enriched through one batched
//! follow-up call and served through the response cache.

use crate::api::channels::ChannelListResponse;
use crate::api::playlist_items::PlaylistItemListResponse;
use crate::api::subscriptions::SubscriptionListResponse;
use crate::api::videos::VideoListResponse;
use crate::cache::{ACCOUNT_DATA_TTL, CHANNEL_VIDEOS_TTL, ResponseCache};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::ApiGateway;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Single-page cap on the subscription listing.
const SUBSCRIPTIONS_PAGE_SIZE: u32 = 50;
/// Videos fetched per channel when the caller does not say otherwise.
pub const DEFAULT_VIDEO_LIMIT: u32 = 10;

/// The authenticated user's own channel, as shown in the account header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub subscriber_count: Option<String>,
    pub video_count: Option<String>,
    pub view_count: Option<String>,
}

/// A channel the user follows, with its subscriber count already formatted
/// for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSubscription {
    pub channel_id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub subscriber_count: Option<String>,
}

/// One upload, merged from the playlist-item listing and the video-detail
/// listing. Immutable once assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEntry {
    pub video_id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub channel_title: Option<String>,
    pub published_at: Timestamp,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub view_count: Option<String>,
}

/// Read-path aggregation over the gateway, with the cache in front.
#[derive(Clone)]
pub struct FeedAggregator {
    gateway: ApiGateway,
    cache: ResponseCache,
}

impl FeedAggregator {
    pub fn new(gateway: ApiGateway, cache: ResponseCache) -> Self {
        Self { gateway, cache }
    }

    /// The authenticated user's channel profile, or `None` for accounts
    /// without one. Cached for five minutes.
    pub async fn user_info(&self) -> GatewayResult<Option<UserInfo>> {
        const CACHE_KEY: &str = "user_info";
        if let Some(hit) = self.cache.get(CACHE_KEY).await {
            return Ok(Some(serde_json::from_value(hit)?));
        }

        let body = self
            .gateway
            .get(
                "channels",
                &[
                    ("part", "snippet,statistics".into()),
                    ("mine", "true".into()),
                ],
            )
            .await?;
        let channels: ChannelListResponse = serde_json::from_value(body)?;

        let Some(channel) = channels.items.into_iter().next() else {
            return Ok(None);
        };
        let Some(snippet) = channel.snippet else {
            return Ok(None);
        };
        let statistics = channel.statistics;

        let info = UserInfo {
            id: channel.id,
            title: snippet.title,
            description: snippet.description,
            thumbnail: snippet.thumbnails.default.map(|t| t.url),
            subscriber_count: statistics.as_ref().and_then(|s| s.subscriber_count.clone()),
            video_count: statistics.as_ref().and_then(|s| s.video_count.clone()),
            view_count: statistics.and_then(|s| s.view_count),
        };

        self.cache
            .put(CACHE_KEY, serde_json::to_value(&info)?, ACCOUNT_DATA_TTL)
            .await;
        Ok(Some(info))
    }

    /// The user's subscriptions (one page, capped), each enriched with a
    /// formatted subscriber count through a single batched channel lookup.
    /// Cached for five minutes.
    pub async fn subscriptions(&self) -> GatewayResult<Vec<ChannelSubscription>> {
        const CACHE_KEY: &str = "subscriptions";
        if let Some(hit) = self.cache.get(CACHE_KEY).await {
            return Ok(serde_json::from_value(hit)?);
        }

        let body = self
            .gateway
            .get(
                "subscriptions",
                &[
                    ("part", "snippet".into()),
                    ("mine", "true".into()),
                    ("maxResults", SUBSCRIPTIONS_PAGE_SIZE.to_string()),
                ],
            )
            .await?;
        let listing: SubscriptionListResponse = serde_json::from_value(body)?;

        let mut subscriptions: Vec<ChannelSubscription> = listing
            .items
            .into_iter()
            .map(|item| {
                let snippet = item.snippet;
                ChannelSubscription {
                    channel_id: snippet.resource_id.channel_id,
                    title: snippet.title,
                    thumbnail: snippet.thumbnails.default.map(|t| t.url),
                    description: snippet.description,
                    subscriber_count: None,
                }
            })
            .collect();

        // One extra call for the whole batch, regardless of count.
        if !subscriptions.is_empty() {
            let channel_ids = subscriptions
                .iter()
                .map(|s| s.channel_id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            let body = self
                .gateway
                .get(
                    "channels",
                    &[("part", "statistics".into()), ("id", channel_ids)],
                )
                .await?;
            let channels: ChannelListResponse = serde_json::from_value(body)?;

            for channel in channels.items {
                if let Some(subscription) = subscriptions
                    .iter_mut()
                    .find(|s| s.channel_id == channel.id)
                {
                    let raw = channel.statistics.and_then(|s| s.subscriber_count);
                    subscription.subscriber_count = Some(format_count(raw.as_deref()));
                }
            }
        }

        tracing::debug!(count = subscriptions.len(), "fetched subscriptions");
        self.cache
            .put(
                CACHE_KEY,
                serde_json::to_value(&subscriptions)?,
                ACCOUNT_DATA_TTL,
            )
            .await;
        Ok(subscriptions)
    }

    /// The channel's most recent uploads, at most `limit` of them.
    ///
    /// Two-stage resolution: the channel resource names its uploads feed,
    /// the feed is listed, and one batched video call attaches duration and
    /// view count. A channel that is missing or has never uploaded yields an
    /// empty list, not an error. Cached per `(channel, limit)` for three
    /// minutes.
    pub async fn channel_videos(
        &self,
        channel_id: &str,
        limit: u32,
    ) -> GatewayResult<Vec<VideoEntry>> {
        let cache_key = format!("channel_videos_{channel_id}_{limit}");
        if let Some(hit) = self.cache.get(&cache_key).await {
            return Ok(serde_json::from_value(hit)?);
        }

        let body = self
            .gateway
            .get(
                "channels",
                &[
                    ("part", "contentDetails".into()),
                    ("id", channel_id.to_string()),
                ],
            )
            .await?;
        let channels: ChannelListResponse = serde_json::from_value(body)?;
        let uploads_playlist = channels
            .items
            .into_iter()
            .next()
            .and_then(|channel| channel.content_details)
            .and_then(|details| details.related_playlists.uploads);
        let Some(uploads_playlist) = uploads_playlist else {
            tracing::debug!(channel_id, "channel has no uploads feed");
            return Ok(Vec::new());
        };

        let body = self
            .gateway
            .get(
                "playlistItems",
                &[
                    ("part", "snippet".into()),
                    ("playlistId", uploads_playlist),
                    ("maxResults", limit.to_string()),
                ],
            )
            .await?;
        let listing: PlaylistItemListResponse = serde_json::from_value(body)?;

        let mut videos: Vec<VideoEntry> = listing
            .items
            .into_iter()
            .map(|item| {
                let snippet = item.snippet;
                VideoEntry {
                    video_id: snippet.resource_id.video_id,
                    title: snippet.title,
                    thumbnail: snippet.thumbnails.medium.map(|t| t.url),
                    channel_title: snippet.channel_title,
                    published_at: snippet.published_at,
                    description: snippet.description,
                    duration: None,
                    view_count: None,
                }
            })
            .collect();

        if !videos.is_empty() {
            let video_ids = videos
                .iter()
                .map(|v| v.video_id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            let body = self
                .gateway
                .get(
                    "videos",
                    &[
                        ("part", "contentDetails,statistics".into()),
                        ("id", video_ids),
                    ],
                )
                .await?;
            let details: VideoListResponse = serde_json::from_value(body)?;

            for video in details.items {
                if let Some(entry) = videos.iter_mut().find(|v| v.video_id == video.id) {
                    entry.duration = video.content_details.and_then(|d| d.duration);
                    entry.view_count = video.statistics.and_then(|s| s.view_count);
                }
            }
        }

        tracing::debug!(channel_id, count = videos.len(), "fetched channel videos");
        self.cache
            .put(&cache_key, serde_json::to_value(&videos)?, CHANNEL_VIDEOS_TTL)
            .await;
        Ok(videos)
    }

    /// Merges recent uploads across `channel_ids`, drops already-watched
    /// videos, and sorts newest first (fetch order breaks ties).
    ///
    /// A channel whose fetch fails contributes nothing and does not abort
    /// the rest; auth failures still abort, since every remaining channel
    /// would fail the same way.
    pub async fn recent_uploads(
        &self,
        channel_ids: &[String],
        limit: u32,
        watched: &HashSet<String>,
    ) -> GatewayResult<Vec<VideoEntry>> {
        let mut merged = Vec::new();
        for channel_id in channel_ids {
            match self.channel_videos(channel_id, limit).await {
                Ok(videos) => merged.extend(videos),
                Err(error @ (GatewayError::AuthRequired | GatewayError::AuthExpired)) => {
                    return Err(error);
                }
                Err(error) => {
                    tracing::warn!(channel_id, %error, "skipping channel after fetch failure");
                }
            }
        }

        merged.retain(|video| !watched.contains(&video.video_id));
        merged.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(merged)
    }
}

/// Renders large counts the way the UI shows them: `1K`, `2M`, plain digits
/// below a thousand, and `0` for absent or unparsable input.
pub fn format_count(raw: Option<&str>) -> String {
    let Some(count) = raw.and_then(|r| r.parse::<u64>().ok()) else {
        return "0".to_owned();
    };
    if count >= 1_000_000 {
        format!("{}M", count / 1_000_000)
    } else if count >= 1_000 {
        format!("{}K", count / 1_000)
    } else {
        count.to_string()
    }
}
