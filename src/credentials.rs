use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// A session's token set: access token, refresh token and absolute expiry.
///
/// Mutated only by whole-set replacement (never field by field) so a reader
/// can never observe an access token from one exchange paired with a refresh
/// token from another.
///
/// `expires_at` serializes as RFC 3339, so stores that persist credentials
/// as JSON (cookies, server-side sessions) keep an absolute UTC instant —
/// never a local time. An absent `expires_at` means "unknown, must renew".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

impl CredentialSet {
    /// Create a credential set for a sign-in that supplied all three fields.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at,
        }
    }

    /// Whether the access token must be renewed before use.
    ///
    /// True when expiry is unknown, or when `expires_at - margin <= now`.
    /// The margin guards against clock skew and in-flight request latency:
    /// a token valid for only a few seconds at read time must not be handed
    /// to a caller that will use it seconds later. Comparison is in UTC.
    #[must_use]
    pub fn needs_renewal(&self, now: OffsetDateTime, margin: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - margin <= now,
            None => true,
        }
    }
}
