use std::collections::HashMap;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::{Mutex, OnceCell};

use crate::config::AuthConfig;
use crate::credentials::CredentialSet;
use crate::discovery::{DiscoveryClient, DiscoveryDocument};
use crate::error::{ConfigError, RenewalError};
use crate::exchange::TokenExchangeClient;
use crate::outbound::{ApiClient, ApiClientBuilder};
use crate::store::CredentialStore;
use crate::types::SessionId;

/// Source of the current UTC instant.
///
/// Injected into [`TokenManager`] so expiry decisions are testable against a
/// fixed clock.
pub trait Clock: Send + Sync + 'static {
    fn now_utc(&self) -> OffsetDateTime;
}

/// The real clock. Default for [`TokenManager`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Orchestrates the credential lifecycle for every session.
///
/// The single external contract is
/// [`obtain_valid_access_token`](Self::obtain_valid_access_token): reuse the
/// stored access token while it is comfortably inside its lifetime, renew it
/// via the refresh-token grant otherwise, and persist the renewed set back
/// through the [`CredentialStore`] as one atomic replacement.
///
/// # Concurrency
///
/// Most providers rotate refresh tokens — a refresh token spent twice is a
/// correctness bug, not an efficiency problem. The manager therefore keeps a
/// lock per session: concurrent callers for the same session serialize
/// behind the in-flight renewal, re-read the store once they hold the lock,
/// and find the already-renewed token there. Exactly one exchange happens no
/// matter how many callers race. The lock is held only around
/// read-decide-renew-write, never during the caller's own work.
pub struct TokenManager<S, C = SystemClock> {
    config: AuthConfig,
    store: S,
    clock: C,
    discovery: DiscoveryClient,
    exchange: TokenExchangeClient,
    // Issuer metadata changes rarely; cached for the process lifetime.
    document: OnceCell<DiscoveryDocument>,
    // One gate per session. Entries are a pointer each and are never pruned;
    // sessions outnumbering memory here would exhaust the store first.
    renewal_gates: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl<S: CredentialStore> TokenManager<S> {
    /// Create a manager backed by the given store, using the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: AuthConfig, store: S) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(ConfigError::HttpClient)?;

        let exchange = TokenExchangeClient::new(
            http.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        );
        let discovery = DiscoveryClient::new().with_http_client(http);

        Ok(Self {
            config,
            store,
            clock: SystemClock,
            discovery,
            exchange,
            document: OnceCell::new(),
            renewal_gates: Mutex::new(HashMap::new()),
        })
    }
}

impl<S: CredentialStore, C: Clock> TokenManager<S, C> {
    /// Replace the clock (testing).
    #[must_use]
    pub fn with_clock<C2: Clock>(self, clock: C2) -> TokenManager<S, C2> {
        TokenManager {
            config: self.config,
            store: self.store,
            clock,
            discovery: self.discovery,
            exchange: self.exchange,
            document: self.document,
            renewal_gates: self.renewal_gates,
        }
    }

    /// Return an access token that is currently valid for the session.
    ///
    /// - Fresh token (more than the safety margin away from expiry): returned
    ///   as-is, zero network calls, zero writes.
    /// - Stale or unknown expiry: one refresh-token exchange, then the store
    ///   is atomically replaced with the new set and the new token returned.
    /// - Any failure: the store is left exactly as it was. No retries — a
    ///   single renewal failure surfaces immediately; retry policy belongs to
    ///   the caller.
    ///
    /// # Errors
    ///
    /// See [`RenewalError`] for the full taxonomy.
    pub async fn obtain_valid_access_token(
        &self,
        session_id: &SessionId,
    ) -> Result<String, RenewalError> {
        let gate = self.renewal_gate(session_id).await;
        let _guard = tokio::time::timeout(self.config.lock_timeout(), gate.lock())
            .await
            .map_err(|_| RenewalError::LockTimeout)?;

        // Re-read under the gate: a caller that waited out another renewal
        // must see that renewal's result, not its own stale snapshot.
        let credentials = self
            .store
            .get(session_id)
            .await
            .map_err(|e| RenewalError::Store(e.to_string()))?
            .filter(|c| !c.access_token.is_empty())
            .ok_or(RenewalError::NoCredentials)?;

        let now = self.clock.now_utc();
        if !credentials.needs_renewal(now, self.config.renewal_margin()) {
            tracing::debug!(session_id = %session_id, "access token fresh, reusing");
            return Ok(credentials.access_token);
        }

        self.renew(session_id, credentials).await
    }

    /// Obtain a valid access token and hand back a fully configured API
    /// client carrying it.
    ///
    /// # Errors
    ///
    /// Renewal errors as in
    /// [`obtain_valid_access_token`](Self::obtain_valid_access_token), plus
    /// [`RenewalError::Config`] if no API base URL is configured.
    pub async fn authorized_client(
        &self,
        session_id: &SessionId,
    ) -> Result<ApiClient, RenewalError> {
        let access_token = self.obtain_valid_access_token(session_id).await?;
        let base_url = self
            .config
            .api_base_url()
            .cloned()
            .ok_or_else(|| ConfigError::Config("api_base_url is not configured".into()))?;

        Ok(ApiClientBuilder::new(base_url)
            .with_timeout(self.config.http_timeout())
            .build(&access_token)?)
    }

    /// Read access to the backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    async fn renew(
        &self,
        session_id: &SessionId,
        credentials: CredentialSet,
    ) -> Result<String, RenewalError> {
        // Nothing to renew with: distinct, terminal failure. No network call.
        let refresh_token = credentials
            .refresh_token
            .ok_or(RenewalError::NoRefreshToken)?;

        let document = self.discovery_document().await?;
        let response = self
            .exchange
            .exchange_refresh_token(&document.token_endpoint, &refresh_token)
            .await
            .inspect_err(|e| {
                tracing::warn!(session_id = %session_id, error = %e, "token renewal failed");
            })?;

        let now = self.clock.now_utc();
        // A lifetime so large it overflows the representable date range is
        // stored as unknown expiry, which forces renewal on next use.
        let expires_at = response.expires_in.and_then(|secs| {
            let secs = i64::try_from(secs).unwrap_or(i64::MAX);
            now.checked_add(time::Duration::seconds(secs))
        });
        let renewed = CredentialSet {
            access_token: response.access_token.clone(),
            // Provider did not rotate: the old refresh token stays live.
            refresh_token: response.refresh_token.or(Some(refresh_token)),
            expires_at,
        };

        self.store
            .replace(session_id, renewed)
            .await
            .map_err(|e| RenewalError::Store(e.to_string()))?;

        tracing::info!(session_id = %session_id, "access token renewed");
        Ok(response.access_token)
    }

    async fn discovery_document(&self) -> Result<&DiscoveryDocument, RenewalError> {
        Ok(self
            .document
            .get_or_try_init(|| self.discovery.discover(self.config.issuer_url()))
            .await?)
    }

    async fn renewal_gate(&self, session_id: &SessionId) -> Arc<Mutex<()>> {
        let mut gates = self.renewal_gates.lock().await;
        gates.entry(session_id.clone()).or_default().clone()
    }
}
