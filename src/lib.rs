//! Background core for a video-platform companion: owns the authenticated
//! session, mediates every API call, caches read responses, aggregates
//! recent uploads across channels, and sequences playlist mutations, all
//! behind a single message-dispatch entry point consumed by the UI layer.

use crate::auth::IdentityProvider;
use crate::cache::ResponseCache;
use crate::feed::FeedAggregator;
use crate::gateway::{ApiGateway, ApiTransport};
use crate::playlists::PlaylistManager;
use crate::router::MessageRouter;
use crate::session::{SessionManager, SessionState};
use crate::storage::{KeyValueStore, TokenStore};
use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod cache;
pub mod error;
pub mod feed;
pub mod gateway;
pub mod playlists;
pub mod router;
pub mod session;
pub mod storage;

#[cfg(test)]
mod testutil;

/// Wires the full component stack over the given storage, identity
/// provider, and transport, and returns the router the message loop
/// dispatches into.
///
/// Session, cache, and token store are created here once and shared by the
/// components that need them; their lifetime is the background process's
/// own.
pub fn build_core(
    store: Arc<dyn KeyValueStore>,
    provider: Arc<dyn IdentityProvider>,
    transport: Arc<dyn ApiTransport>,
) -> MessageRouter {
    let tokens = TokenStore::new(Arc::clone(&store));
    let state = SessionState::new(tokens);
    let session = SessionManager::new(state.clone(), provider);
    let gateway = ApiGateway::new(transport, state);
    let feed = FeedAggregator::new(gateway.clone(), ResponseCache::new());
    let playlists = PlaylistManager::new(gateway);
    MessageRouter::new(session, feed, playlists, store)
}
