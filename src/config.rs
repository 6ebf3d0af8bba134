use url::Url;

use crate::error::ConfigError;

/// Relying-party configuration.
///
/// Required fields are constructor parameters — no runtime "missing field"
/// errors.
///
/// ```rust,ignore
/// use marvin_auth::AuthConfig;
///
/// let config = AuthConfig::new("https://idp.example.com".parse()?, "my-client", "secret");
/// // Optional overrides via chaining:
/// let config = config.with_renewal_margin(time::Duration::seconds(120));
/// ```
#[derive(Clone)]
#[non_exhaustive]
pub struct AuthConfig {
    pub(crate) issuer_url: Url,
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) api_base_url: Option<Url>,
    pub(crate) renewal_margin: time::Duration,
    pub(crate) http_timeout: std::time::Duration,
    pub(crate) lock_timeout: std::time::Duration,
}

impl AuthConfig {
    /// Create a new configuration for the given issuer and client.
    #[must_use]
    pub fn new(
        issuer_url: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            issuer_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base_url: None,
            renewal_margin: time::Duration::seconds(60),
            http_timeout: std::time::Duration::from_secs(10),
            lock_timeout: std::time::Duration::from_secs(30),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Required env vars
    /// - `MARVIN_ISSUER_URL`: issuer base URL (must be a valid URL)
    /// - `MARVIN_CLIENT_ID`: OAuth2 client ID
    /// - `MARVIN_CLIENT_SECRET`: OAuth2 client secret
    ///
    /// # Optional env vars
    /// - `MARVIN_API_BASE_URL`: base URL for outbound API clients
    /// - `MARVIN_RENEWAL_MARGIN_SECS`: renewal safety margin (default 60)
    /// - `MARVIN_HTTP_TIMEOUT_SECS`: HTTP request timeout (default 10)
    /// - `MARVIN_LOCK_TIMEOUT_SECS`: per-session renewal lock timeout (default 30)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Config`] if required env vars are missing or
    /// values are invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let issuer_str = std::env::var("MARVIN_ISSUER_URL")
            .map_err(|_| ConfigError::Config("MARVIN_ISSUER_URL is required".into()))?;
        let issuer_url: Url = issuer_str
            .parse()
            .map_err(|e| ConfigError::Config(format!("MARVIN_ISSUER_URL: {e}")))?;
        let client_id = std::env::var("MARVIN_CLIENT_ID")
            .map_err(|_| ConfigError::Config("MARVIN_CLIENT_ID is required".into()))?;
        let client_secret = std::env::var("MARVIN_CLIENT_SECRET")
            .map_err(|_| ConfigError::Config("MARVIN_CLIENT_SECRET is required".into()))?;

        let mut config = Self::new(issuer_url, client_id, client_secret);

        if let Ok(url_str) = std::env::var("MARVIN_API_BASE_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| ConfigError::Config(format!("MARVIN_API_BASE_URL: {e}")))?;
            config = config.with_api_base_url(url);
        }
        if let Ok(secs) = std::env::var("MARVIN_RENEWAL_MARGIN_SECS") {
            let secs: i64 = secs
                .parse()
                .map_err(|e| ConfigError::Config(format!("MARVIN_RENEWAL_MARGIN_SECS: {e}")))?;
            config = config.with_renewal_margin(time::Duration::seconds(secs));
        }
        if let Ok(secs) = std::env::var("MARVIN_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| ConfigError::Config(format!("MARVIN_HTTP_TIMEOUT_SECS: {e}")))?;
            config = config.with_http_timeout(std::time::Duration::from_secs(secs));
        }
        if let Ok(secs) = std::env::var("MARVIN_LOCK_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| ConfigError::Config(format!("MARVIN_LOCK_TIMEOUT_SECS: {e}")))?;
            config = config.with_lock_timeout(std::time::Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Base URL for outbound API clients built by the manager.
    #[must_use]
    pub fn with_api_base_url(mut self, url: Url) -> Self {
        self.api_base_url = Some(url);
        self
    }

    /// Override the renewal safety margin (default: 60 seconds).
    #[must_use]
    pub fn with_renewal_margin(mut self, margin: time::Duration) -> Self {
        self.renewal_margin = margin;
        self
    }

    /// Override the HTTP request timeout (default: 10 seconds).
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Override the per-session renewal lock timeout (default: 30 seconds).
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Issuer base URL.
    #[must_use]
    pub fn issuer_url(&self) -> &Url {
        &self.issuer_url
    }

    /// OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Base URL for outbound API clients, if configured.
    #[must_use]
    pub fn api_base_url(&self) -> Option<&Url> {
        self.api_base_url.as_ref()
    }

    /// Renewal safety margin.
    #[must_use]
    pub fn renewal_margin(&self) -> time::Duration {
        self.renewal_margin
    }

    /// HTTP request timeout.
    #[must_use]
    pub fn http_timeout(&self) -> std::time::Duration {
        self.http_timeout
    }

    /// Per-session renewal lock timeout.
    #[must_use]
    pub fn lock_timeout(&self) -> std::time::Duration {
        self.lock_timeout
    }
}

// Manual Debug: the client secret must never reach logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer_url", &self.issuer_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url.as_ref().map(Url::as_str))
            .field("renewal_margin", &self.renewal_margin)
            .field("http_timeout", &self.http_timeout)
            .field("lock_timeout", &self.lock_timeout)
            .finish()
    }
}
