//! Test doubles for the seams: a scripted API transport that records every
//! request, and an identity provider that counts prompts.

use crate::auth::IdentityProvider;
use crate::cache::ResponseCache;
use crate::error::{GatewayError, GatewayResult};
use crate::feed::FeedAggregator;
use crate::gateway::{ApiGateway, ApiRequest, ApiResponse, ApiTransport};
use crate::playlists::PlaylistManager;
use crate::router::MessageRouter;
use crate::session::{SessionManager, SessionState};
use crate::storage::{MemoryStore, TokenStore};
use async_trait::async_trait;
use http::Method;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Duration;

pub const TEST_BASE_URL: &str = "https://api.invalid/v3";

struct Rule {
    method: Method,
    url_fragment: String,
    status: u16,
    body: Value,
}

/// Responds per (method, url-substring) rule and records every request, so
/// tests can assert exact call counts and bodies.
#[derive(Default)]
pub struct ScriptedTransport {
    rules: Mutex<Vec<Rule>>,
    log: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a response for requests whose (percent-decoded) URL
    /// contains `url_fragment`. Earlier rules win.
    pub fn respond(&self, method: Method, url_fragment: &str, status: u16, body: Value) {
        self.rules.lock().unwrap().push(Rule {
            method,
            url_fragment: url_fragment.to_owned(),
            status,
            body,
        });
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.log.lock().unwrap().clone()
    }

    /// Recorded URLs with `%2C` decoded back to commas, for readable
    /// assertions on comma-joined id batches.
    pub fn decoded_urls(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| r.url.replace("%2C", ","))
            .collect()
    }

    pub fn calls_to(&self, url_fragment: &str) -> usize {
        self.decoded_urls()
            .iter()
            .filter(|url| url.contains(url_fragment))
            .count()
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> GatewayResult<ApiResponse> {
        self.log.lock().unwrap().push(request.clone());
        let decoded = request.url.replace("%2C", ",");
        let rules = self.rules.lock().unwrap();
        for rule in rules.iter() {
            if rule.method == request.method && decoded.contains(&rule.url_fragment) {
                return Ok(ApiResponse {
                    status: rule.status,
                    body: rule.body.clone(),
                });
            }
        }
        panic!("no scripted response for {} {}", request.method, request.url);
    }
}

/// Identity provider that hands out a fixed token and counts how often it
/// was asked, so coalescing tests can assert a single prompt.
pub struct CountingProvider {
    token: String,
    fail_authenticate: bool,
    fail_revoke: bool,
    delay: Duration,
    pub prompts: AtomicUsize,
    pub revocations: AtomicUsize,
}

impl CountingProvider {
    pub fn returning(token: &str) -> Self {
        Self {
            token: token.to_owned(),
            fail_authenticate: false,
            fail_revoke: false,
            delay: Duration::ZERO,
            prompts: AtomicUsize::new(0),
            revocations: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_authenticate: true,
            ..Self::returning("unused")
        }
    }

    /// Makes `authenticate` take this long, so tests can overlap callers.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_failing_revoke(mut self) -> Self {
        self.fail_revoke = true;
        self
    }
}

#[async_trait]
impl IdentityProvider for CountingProvider {
    async fn authenticate(&self) -> GatewayResult<String> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        if self.delay > Duration::ZERO {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_authenticate {
            return Err(GatewayError::Auth("user declined".into()));
        }
        Ok(self.token.clone())
    }

    async fn revoke(&self, _token: &str) -> GatewayResult<()> {
        self.revocations.fetch_add(1, Ordering::SeqCst);
        if self.fail_revoke {
            return Err(GatewayError::Api { status: 500 });
        }
        Ok(())
    }
}

/// Gateway over a fresh, empty session. No token is held.
pub fn unauthenticated_gateway(transport: Arc<ScriptedTransport>) -> (ApiGateway, SessionState) {
    let store = TokenStore::new(Arc::new(MemoryStore::new()));
    let state = SessionState::new(store);
    let gateway = ApiGateway::with_base_url(transport, state.clone(), TEST_BASE_URL);
    (gateway, state)
}

/// Gateway whose session already holds the token `test-token`.
pub async fn authenticated_gateway(
    transport: Arc<ScriptedTransport>,
) -> (ApiGateway, SessionState) {
    let (gateway, state) = unauthenticated_gateway(transport);
    let manager = SessionManager::new(
        state.clone(),
        Arc::new(CountingProvider::returning("test-token")),
    );
    manager
        .authenticate()
        .await
        .expect("test sign-in cannot fail");
    (gateway, state)
}

/// A full component stack over in-memory storage and a scripted transport.
pub fn build_test_router(
    provider: CountingProvider,
) -> (MessageRouter, Arc<ScriptedTransport>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(ScriptedTransport::new());

    let tokens = TokenStore::new(Arc::clone(&store) as Arc<dyn crate::storage::KeyValueStore>);
    let state = SessionState::new(tokens);
    let session = SessionManager::new(state.clone(), Arc::new(provider));
    let gateway = ApiGateway::with_base_url(
        Arc::clone(&transport) as Arc<dyn ApiTransport>,
        state,
        TEST_BASE_URL,
    );
    let feed = FeedAggregator::new(gateway.clone(), ResponseCache::new());
    let playlists = PlaylistManager::new(gateway);
    let router = MessageRouter::new(
        session,
        feed,
        playlists,
        Arc::clone(&store) as Arc<dyn crate::storage::KeyValueStore>,
    );
    (router, transport, store)
}
