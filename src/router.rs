//! Single-entry dispatch from UI-layer requests to the core components.
//!
//! Requests arrive as JSON with an `action` tag; the catalog is a closed
//! enum, so an unhandled action is a compile error here rather than a
//! runtime fallthrough. The router owns no logic: it parses, delegates,
//! and folds every outcome into the `{ success, data?, error? }` envelope.
//! No error may escape it.

use crate::error::GatewayResult;
use crate::feed::{DEFAULT_VIDEO_LIMIT, FeedAggregator};
use crate::playlists::PlaylistManager;
use crate::session::SessionManager;
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// Storage key for the locally tracked watch history. The external API does
/// not expose watch history, so the UI records it here.
const WATCH_HISTORY_KEY: &str = "watchHistory";

/// The full action catalog accepted from the UI layer.
#[derive(Debug, Deserialize)]
#[serde(tag = "action")]
pub enum UiRequest {
    #[serde(rename = "authenticate")]
    Authenticate,
    #[serde(rename = "revokeToken")]
    RevokeToken,
    #[serde(rename = "getUserInfo")]
    GetUserInfo,
    #[serde(rename = "getSubscriptions")]
    GetSubscriptions,
    #[serde(rename = "getChannelVideos", rename_all = "camelCase")]
    GetChannelVideos {
        channel_id: String,
        limit: Option<u32>,
    },
    #[serde(rename = "createPlaylist")]
    CreatePlaylist {
        title: String,
        description: Option<String>,
    },
    #[serde(rename = "deletePlaylist", rename_all = "camelCase")]
    DeletePlaylist { playlist_id: String },
    #[serde(rename = "addVideoToPlaylist", rename_all = "camelCase")]
    AddVideoToPlaylist {
        playlist_id: String,
        video_id: String,
        position: Option<u32>,
    },
    #[serde(rename = "removeVideoFromPlaylist", rename_all = "camelCase")]
    RemoveVideoFromPlaylist { playlist_item_id: String },
    #[serde(rename = "reorderPlaylistItem", rename_all = "camelCase")]
    ReorderPlaylistItem {
        playlist_item_id: String,
        new_position: u32,
    },
    #[serde(rename = "getPlaylists")]
    GetPlaylists,
    #[serde(rename = "getPlaylistItems", rename_all = "camelCase")]
    GetPlaylistItems { playlist_id: String },
    #[serde(rename = "getWatchHistory")]
    GetWatchHistory,
}

/// Wire envelope for every response.
#[derive(Debug, Serialize)]
pub struct UiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UiResponse {
    pub fn ok(data: Option<Value>) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

pub struct MessageRouter {
    session: SessionManager,
    feed: FeedAggregator,
    playlists: PlaylistManager,
    store: Arc<dyn KeyValueStore>,
}

impl MessageRouter {
    pub fn new(
        session: SessionManager,
        feed: FeedAggregator,
        playlists: PlaylistManager,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            session,
            feed,
            playlists,
            store,
        }
    }

    /// Loads a persisted session into memory; call once at process start.
    pub async fn restore_session(&self) {
        self.session.restore().await;
    }

    /// Handles one request end to end. Never panics and never lets an error
    /// escape; the caller always gets an envelope.
    pub async fn dispatch(&self, raw: Value) -> UiResponse {
        let request: UiRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(error) => {
                let message = error.to_string();
                if message.starts_with("unknown variant") || message.starts_with("missing field `action`") {
                    return UiResponse::err("Unknown action");
                }
                return UiResponse::err(message);
            }
        };

        tracing::debug!(?request, "dispatching UI request");
        match self.handle(request).await {
            Ok(data) => UiResponse::ok(data),
            Err(error) => {
                tracing::warn!(%error, "request failed");
                UiResponse::err(error.to_string())
            }
        }
    }

    async fn handle(&self, request: UiRequest) -> GatewayResult<Option<Value>> {
        match request {
            UiRequest::Authenticate => {
                let token = self.session.authenticate().await?;
                Ok(Some(Value::String(token)))
            }
            UiRequest::RevokeToken => {
                self.session.revoke().await?;
                Ok(None)
            }
            UiRequest::GetUserInfo => {
                let info = self.feed.user_info().await?;
                Ok(Some(serde_json::to_value(info)?))
            }
            UiRequest::GetSubscriptions => {
                let subscriptions = self.feed.subscriptions().await?;
                Ok(Some(serde_json::to_value(subscriptions)?))
            }
            UiRequest::GetChannelVideos { channel_id, limit } => {
                let videos = self
                    .feed
                    .channel_videos(&channel_id, limit.unwrap_or(DEFAULT_VIDEO_LIMIT))
                    .await?;
                Ok(Some(serde_json::to_value(videos)?))
            }
            UiRequest::CreatePlaylist { title, description } => {
                let playlist = self
                    .playlists
                    .create(&title, description.as_deref().unwrap_or(""))
                    .await?;
                Ok(Some(serde_json::to_value(playlist)?))
            }
            UiRequest::DeletePlaylist { playlist_id } => {
                self.playlists.delete(&playlist_id).await?;
                Ok(None)
            }
            UiRequest::AddVideoToPlaylist {
                playlist_id,
                video_id,
                position,
            } => {
                self.playlists
                    .add_item(&playlist_id, &video_id, position)
                    .await?;
                Ok(None)
            }
            UiRequest::RemoveVideoFromPlaylist { playlist_item_id } => {
                self.playlists.remove_item(&playlist_item_id).await?;
                Ok(None)
            }
            UiRequest::ReorderPlaylistItem {
                playlist_item_id,
                new_position,
            } => {
                self.playlists
                    .reorder_item(&playlist_item_id, new_position)
                    .await?;
                Ok(None)
            }
            UiRequest::GetPlaylists => {
                let playlists = self.playlists.playlists().await?;
                Ok(Some(serde_json::to_value(playlists)?))
            }
            UiRequest::GetPlaylistItems { playlist_id } => {
                let items = self.playlists.items(&playlist_id).await?;
                Ok(Some(serde_json::to_value(items)?))
            }
            UiRequest::GetWatchHistory => {
                let stored = self.store.get(WATCH_HISTORY_KEY).await?;
                Ok(Some(stored.unwrap_or_else(|| json!([]))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CountingProvider, build_test_router};
    use http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn unknown_actions_get_the_fixed_error() {
        let (router, _transport, _store) = build_test_router(CountingProvider::returning("tok"));

        let response = router.dispatch(json!({ "action": "danceParty" })).await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Unknown action"));

        let response = router.dispatch(json!({ "no_action": true })).await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Unknown action"));
    }

    #[tokio::test]
    async fn authenticate_returns_the_token_in_the_envelope() {
        let (router, _transport, _store) = build_test_router(CountingProvider::returning("tok-9"));

        let response = router.dispatch(json!({ "action": "authenticate" })).await;
        assert!(response.success);
        assert_eq!(response.data, Some(json!("tok-9")));
        assert_eq!(response.error, None);
    }

    #[tokio::test]
    async fn component_errors_become_error_envelopes() {
        let (router, _transport, _store) = build_test_router(CountingProvider::returning("tok"));

        // No sign-in has happened, so the gateway refuses the call.
        let response = router.dispatch(json!({ "action": "getSubscriptions" })).await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("not authenticated"));
    }

    #[tokio::test]
    async fn channel_videos_parses_camel_case_fields() {
        let (router, transport, _store) = build_test_router(CountingProvider::returning("tok"));
        transport.respond(Method::GET, "channels", 200, json!({ "items": [] }));

        router.dispatch(json!({ "action": "authenticate" })).await;
        let response = router
            .dispatch(json!({ "action": "getChannelVideos", "channelId": "UC1", "limit": 3 }))
            .await;

        assert!(response.success);
        assert_eq!(response.data, Some(json!([])));
        assert!(transport.requests()[0].url.contains("id=UC1"));
    }

    #[tokio::test]
    async fn watch_history_defaults_to_empty() {
        let (router, _transport, store) = build_test_router(CountingProvider::returning("tok"));

        let response = router.dispatch(json!({ "action": "getWatchHistory" })).await;
        assert!(response.success);
        assert_eq!(response.data, Some(json!([])));

        store
            .set(WATCH_HISTORY_KEY, json!(["v1", "v2"]))
            .await
            .unwrap();
        let response = router.dispatch(json!({ "action": "getWatchHistory" })).await;
        assert_eq!(response.data, Some(json!(["v1", "v2"])));
    }

    #[tokio::test]
    async fn revoke_succeeds_even_when_remote_revocation_fails() {
        let (router, _transport, _store) =
            build_test_router(CountingProvider::returning("tok").with_failing_revoke());

        router.dispatch(json!({ "action": "authenticate" })).await;
        let response = router.dispatch(json!({ "action": "revokeToken" })).await;
        assert!(response.success);
    }

    #[tokio::test]
    async fn envelope_skips_absent_fields() {
        let response = UiResponse::ok(None);
        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire, json!({ "success": true }));

        let response = UiResponse::err("boom");
        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire, json!({ "success": false, "error": "boom" }));
    }
}
