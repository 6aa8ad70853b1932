//! Session ownership: the shared bearer-token cell and the sign-in and
//! sign-out flows around it.

use crate::auth::IdentityProvider;
use crate::error::{GatewayError, GatewayResult};
use crate::storage::TokenStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The process-wide token cell, shared between the session manager (which
/// fills it) and the gateway (which reads it and may reset it on 401).
///
/// `Some` is an authenticated session, `None` unauthenticated. Expiry is
/// detected lazily when the API rejects a call, never tracked proactively.
#[derive(Clone)]
pub struct SessionState {
    token: Arc<Mutex<Option<String>>>,
    store: TokenStore,
}

impl SessionState {
    pub fn new(store: TokenStore) -> Self {
        Self {
            token: Arc::new(Mutex::new(None)),
            store,
        }
    }

    /// Current bearer token, if any.
    pub async fn bearer(&self) -> Option<String> {
        self.token.lock().await.clone()
    }

    /// Forced reset after the API rejects the token: drops it from memory
    /// and from durable storage. A storage failure here is logged, not
    /// propagated; the in-memory reset alone is enough to force re-auth.
    pub async fn invalidate(&self) {
        self.token.lock().await.take();
        if let Err(error) = self.store.clear().await {
            tracing::warn!(%error, "could not clear stored token during session reset");
        }
    }
}

/// Owns the authenticate/revoke lifecycle. All other components observe the
/// session only through [`SessionState`].
pub struct SessionManager {
    state: SessionState,
    provider: Arc<dyn IdentityProvider>,
}

impl SessionManager {
    pub fn new(state: SessionState, provider: Arc<dyn IdentityProvider>) -> Self {
        Self { state, provider }
    }

    /// Loads a previously persisted token into memory, typically once at
    /// process start. Missing or unreadable storage leaves the session
    /// unauthenticated.
    pub async fn restore(&self) {
        if let Some(stored) = self.state.store.load().await {
            *self.state.token.lock().await = Some(stored);
            tracing::debug!("restored persisted session token");
        }
    }

    /// Signs the user in and returns the bearer token.
    ///
    /// The token cell stays locked across the identity-provider round trip,
    /// so concurrent callers coalesce onto a single prompt: whoever arrives
    /// second awaits the first attempt's outcome and reuses its token.
    pub async fn authenticate(&self) -> GatewayResult<String> {
        let mut slot = self.state.token.lock().await;
        if let Some(token) = slot.as_ref() {
            tracing::trace!("reusing in-memory token");
            return Ok(token.clone());
        }

        tracing::info!("requesting token from identity provider");
        let token = self.provider.authenticate().await?;

        if let Err(error) = self.state.store.save(&token).await {
            tracing::warn!(%error, "token not persisted, session is in-memory only");
        }
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Signs the user out.
    ///
    /// Remote revocation is best-effort: a failure there is logged and
    /// swallowed, because the local teardown (memory and durable token
    /// cleared) must still complete. Only a local failure reaches the
    /// caller. Revoking with no active session is a no-op.
    pub async fn revoke(&self) -> GatewayResult<()> {
        let token = self.state.token.lock().await.clone();
        let Some(token) = token else {
            tracing::debug!("revoke requested with no active session");
            return Ok(());
        };

        if let Err(error) = self.provider.revoke(&token).await {
            let warning = GatewayError::RevocationWarning(error.to_string());
            tracing::warn!(%warning, "continuing with local sign-out");
        }

        self.state.token.lock().await.take();
        self.state.store.clear().await?;
        tracing::info!("session revoked");
        Ok(())
    }
}
