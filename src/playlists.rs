//! Playlist mutations and listings.
//!
//! Everything here goes straight to the live API; mutations must never be
//! answered from the cache, and they leave existing cache entries alone
//! (staleness after a write is bounded by the read-path TTLs).

use crate::api::playlist_items::{PlaylistItemListResponse, RawPlaylistItemListResponse};
use crate::api::playlists::{Playlist, PlaylistListResponse};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::ApiGateway;
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Single-page cap on the user's playlist listing.
const PLAYLIST_PAGE_SIZE: u32 = 25;
/// Single-page cap on a playlist's item listing. Items beyond this are not
/// retrieved; no continuation tokens are walked.
const PLAYLIST_ITEM_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub item_count: u32,
}

impl From<Playlist> for PlaylistSummary {
    fn from(playlist: Playlist) -> Self {
        Self {
            id: playlist.id,
            title: playlist.snippet.title,
            description: playlist.snippet.description,
            thumbnail: playlist.snippet.thumbnails.default.map(|t| t.url),
            item_count: playlist
                .content_details
                .map(|details| details.item_count)
                .unwrap_or(0),
        }
    }
}

/// One playlist membership. `id` is the membership id the mutation calls
/// need, not the video id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    pub id: String,
    pub video_id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub channel_title: Option<String>,
    pub position: Option<u32>,
}

/// Sequences playlist writes against an API that offers no atomic "move".
#[derive(Clone)]
pub struct PlaylistManager {
    gateway: ApiGateway,
}

impl PlaylistManager {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// Creates a playlist with the fixed default visibility of `private`.
    pub async fn create(&self, title: &str, description: &str) -> GatewayResult<PlaylistSummary> {
        let body = json!({
            "snippet": { "title": title, "description": description },
            "status": { "privacyStatus": "private" }
        });
        let created = self
            .gateway
            .send(
                Method::POST,
                "playlists",
                &[("part", "snippet,status".into())],
                Some(body),
            )
            .await?;
        let playlist: Playlist = serde_json::from_value(created)?;
        tracing::info!(playlist_id = playlist.id, "created playlist");
        Ok(playlist.into())
    }

    pub async fn delete(&self, playlist_id: &str) -> GatewayResult<()> {
        self.gateway
            .send(
                Method::DELETE,
                "playlists",
                &[("id", playlist_id.to_string())],
                None,
            )
            .await?;
        tracing::info!(playlist_id, "deleted playlist");
        Ok(())
    }

    /// Inserts a video reference, optionally at an explicit position. With
    /// no position the server appends.
    pub async fn add_item(
        &self,
        playlist_id: &str,
        video_id: &str,
        position: Option<u32>,
    ) -> GatewayResult<()> {
        let mut snippet = json!({
            "playlistId": playlist_id,
            "resourceId": { "kind": "youtube#video", "videoId": video_id }
        });
        if let Some(position) = position {
            snippet["position"] = json!(position);
        }
        self.gateway
            .send(
                Method::POST,
                "playlistItems",
                &[("part", "snippet".into())],
                Some(json!({ "snippet": snippet })),
            )
            .await?;
        Ok(())
    }

    /// Removes a membership by its playlist-item id.
    pub async fn remove_item(&self, playlist_item_id: &str) -> GatewayResult<()> {
        self.gateway
            .send(
                Method::DELETE,
                "playlistItems",
                &[("id", playlist_item_id.to_string())],
                None,
            )
            .await?;
        Ok(())
    }

    /// Moves an item to `new_position` via read-modify-write.
    ///
    /// The update endpoint requires the complete snippet, so the item is
    /// fetched first and written back with only `position` replaced. If the
    /// item changed between read and write, the last writer wins.
    pub async fn reorder_item(
        &self,
        playlist_item_id: &str,
        new_position: u32,
    ) -> GatewayResult<()> {
        let body = self
            .gateway
            .get(
                "playlistItems",
                &[
                    ("part", "snippet".into()),
                    ("id", playlist_item_id.to_string()),
                ],
            )
            .await?;
        let listing: RawPlaylistItemListResponse = serde_json::from_value(body)?;
        let Some(item) = listing.items.into_iter().next() else {
            return Err(GatewayError::NotFound("playlist item"));
        };

        let mut snippet = item.snippet;
        match &mut snippet {
            Value::Object(fields) => {
                fields.insert("position".to_owned(), json!(new_position));
            }
            _ => {
                return Err(GatewayError::NotFound("playlist item snippet"));
            }
        }

        self.gateway
            .send(
                Method::PUT,
                "playlistItems",
                &[("part", "snippet".into())],
                Some(json!({ "id": item.id, "snippet": snippet })),
            )
            .await?;
        tracing::debug!(playlist_item_id, new_position, "reordered playlist item");
        Ok(())
    }

    /// The user's own playlists, one capped page.
    pub async fn playlists(&self) -> GatewayResult<Vec<PlaylistSummary>> {
        let body = self
            .gateway
            .get(
                "playlists",
                &[
                    ("part", "snippet,contentDetails".into()),
                    ("mine", "true".into()),
                    ("maxResults", PLAYLIST_PAGE_SIZE.to_string()),
                ],
            )
            .await?;
        let listing: PlaylistListResponse = serde_json::from_value(body)?;
        Ok(listing.items.into_iter().map(Into::into).collect())
    }

    /// The items of one playlist, one capped page.
    pub async fn items(&self, playlist_id: &str) -> GatewayResult<Vec<PlaylistEntry>> {
        let body = self
            .gateway
            .get(
                "playlistItems",
                &[
                    ("part", "snippet".into()),
                    ("playlistId", playlist_id.to_string()),
                    ("maxResults", PLAYLIST_ITEM_PAGE_SIZE.to_string()),
                ],
            )
            .await?;
        let listing: PlaylistItemListResponse = serde_json::from_value(body)?;
        Ok(listing
            .items
            .into_iter()
            .map(|item| {
                let snippet = item.snippet;
                PlaylistEntry {
                    id: item.id,
                    video_id: snippet.resource_id.video_id,
                    title: snippet.title,
                    thumbnail: snippet.thumbnails.medium.map(|t| t.url),
                    channel_title: snippet.channel_title,
                    position: snippet.position,
                }
            })
            .collect())
    }
}
