//! Durable key-value persistence and the bearer-token store built on it.
//!
//! The core only needs four primitives from its storage engine, so the seam
//! is a small object-safe trait. Production runs use [`FileStore`], a single
//! JSON object persisted next to the process; tests use [`MemoryStore`].

use crate::error::GatewayResult;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Fixed key under which the bearer token is persisted.
const TOKEN_KEY: &str = "youtube_access_token";

/// Key-value persistence as consumed by the core.
///
/// Besides the token, the store holds UI-owned state: the watched-video list,
/// the enabled-channel set, and the per-channel video-count preference.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> GatewayResult<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> GatewayResult<()>;
    async fn remove(&self, key: &str) -> GatewayResult<()>;
    async fn clear(&self) -> GatewayResult<()>;
}

/// Volatile store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> GatewayResult<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> GatewayResult<()> {
        self.entries.write().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> GatewayResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> GatewayResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// Store backed by one JSON object file, read and rewritten per operation.
///
/// The state is tiny (a token and a handful of UI preferences), so
/// whole-file rewrites are cheaper than carrying a database dependency.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_all(&self) -> GatewayResult<HashMap<String, Value>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(error) => Err(error.into()),
        }
    }

    async fn write_all(&self, entries: &HashMap<String, Value>) -> GatewayResult<()> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> GatewayResult<Option<Value>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> GatewayResult<()> {
        let mut entries = self.read_all().await?;
        entries.insert(key.to_owned(), value);
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> GatewayResult<()> {
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> GatewayResult<()> {
        self.write_all(&HashMap::new()).await
    }
}

/// Passthrough persistence for the single opaque bearer token.
///
/// No validation of token format or freshness happens here.
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Loads the persisted token. Storage failures read as absent so startup
    /// proceeds unauthenticated instead of erroring.
    pub async fn load(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY).await {
            Ok(value) => value.and_then(|v| v.as_str().map(str::to_owned)),
            Err(error) => {
                tracing::warn!(%error, "could not load stored token, treating as absent");
                None
            }
        }
    }

    pub async fn save(&self, token: &str) -> GatewayResult<()> {
        self.store.set(TOKEN_KEY, Value::String(token.to_owned())).await
    }

    pub async fn clear(&self) -> GatewayResult<()> {
        self.store.remove(TOKEN_KEY).await
    }
}
