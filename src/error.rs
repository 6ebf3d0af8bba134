/// Boxed error type used by consumer-implemented traits.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures of [`obtain_valid_access_token`](crate::manager::TokenManager::obtain_valid_access_token).
///
/// A closed set so callers branch on cause instead of string-matching:
/// [`NoCredentials`](RenewalError::NoCredentials), [`NoRefreshToken`](RenewalError::NoRefreshToken)
/// and [`Rejected`](RenewalError::Rejected) are terminal — the user must
/// re-authenticate interactively. [`Transport`](RenewalError::Transport) is
/// safe to retry with backoff; retry policy belongs to the caller.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RenewalError {
    /// The session has never authenticated; no credentials are stored.
    #[error("no credentials stored for session")]
    NoCredentials,

    /// An access token is stored but there is nothing to renew it with.
    #[error("no refresh token available; interactive re-authentication required")]
    NoRefreshToken,

    /// Network/TLS failure reaching the token endpoint, or an unreadable
    /// success response.
    #[error("token endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token endpoint explicitly rejected the refresh token (e.g.
    /// `invalid_grant`). The provider's error detail is preserved for
    /// logging/audit — never show it raw to the end user.
    #[error("token endpoint rejected the refresh token: {error}")]
    Rejected {
        error: String,
        description: Option<String>,
    },

    /// Issuer metadata could not be resolved.
    #[error("issuer discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// The credential store failed to read or replace credentials.
    #[error("credential store error: {0}")]
    Store(String),

    /// Timed out waiting for another caller's in-flight renewal.
    #[error("timed out waiting for an in-flight renewal")]
    LockTimeout,

    /// Missing or invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failures of a single refresh-token exchange.
///
/// Protocol-level rejection (expired/revoked refresh token, invalid client)
/// is [`Rejected`](ExchangeError::Rejected), populated from the server's
/// OAuth error response. Only transport-level failures (DNS, TLS, timeout)
/// are [`Transport`](ExchangeError::Transport).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExchangeError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token endpoint rejected the grant: {error}")]
    Rejected {
        error: String,
        description: Option<String>,
    },
}

impl From<ExchangeError> for RenewalError {
    fn from(e: ExchangeError) -> Self {
        match e {
            ExchangeError::Transport(e) => Self::Transport(e),
            ExchangeError::Rejected { error, description } => {
                Self::Rejected { error, description }
            }
        }
    }
}

/// Failures resolving issuer metadata.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("metadata endpoint returned HTTP {0}")]
    Status(u16),

    #[error("metadata issuer '{actual}' does not match requested issuer '{expected}'")]
    IssuerMismatch { expected: String, actual: String },

    #[error("invalid metadata URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Failures of the claims transformation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClaimsError {
    /// The identity token carried no `sub` claim.
    #[error("identity claims are missing the 'sub' claim")]
    MissingSubject,
}

/// Missing or invalid configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("invalid bearer token for request header")]
    InvalidBearerToken,
}

/// Failures of user provisioning.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RegistrationError {
    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("username must not be empty")]
    EmptyUsername,

    #[error("user repository error: {0}")]
    Repository(String),
}
