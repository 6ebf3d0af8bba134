use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::DiscoveryError;

/// Issuer metadata from OpenID Connect Discovery 1.0 / RFC 8414.
///
/// Only the fields this crate consumes are required; everything else is
/// optional with serde defaults so unknown issuers still parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct DiscoveryDocument {
    /// Issuer identifier URI. Must match the URL the document was fetched for.
    pub issuer: String,
    /// Token endpoint accepting grant requests (RFC 6749 section 3.2).
    pub token_endpoint: Url,
    #[serde(default)]
    pub authorization_endpoint: Option<Url>,
    #[serde(default)]
    pub userinfo_endpoint: Option<Url>,
    #[serde(default)]
    pub jwks_uri: Option<Url>,
    #[serde(default)]
    pub scopes_supported: Option<Vec<String>>,
    #[serde(default)]
    pub grant_types_supported: Option<Vec<String>>,
}

/// Read-only metadata fetch for an issuer.
///
/// Issuer metadata changes rarely, so callers may cache the document for the
/// process lifetime; nothing here depends on caching — running discovery on
/// every renewal is correct, just slower.
pub struct DiscoveryClient {
    http: reqwest::Client,
}

impl Default for DiscoveryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Fetch `{issuer}/.well-known/openid-configuration`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Transport`] on network failure,
    /// [`DiscoveryError::Status`] on a non-2xx response, and
    /// [`DiscoveryError::IssuerMismatch`] if the document claims a different
    /// issuer than the one requested.
    pub async fn discover(&self, issuer_url: &Url) -> Result<DiscoveryDocument, DiscoveryError> {
        let metadata_url = well_known_url(issuer_url)?;

        let response = self.http.get(metadata_url).send().await?;
        if !response.status().is_success() {
            return Err(DiscoveryError::Status(response.status().as_u16()));
        }
        let document: DiscoveryDocument = response.json().await?;

        let expected = issuer_url.as_str().trim_end_matches('/');
        let actual = document.issuer.trim_end_matches('/');
        if expected != actual {
            return Err(DiscoveryError::IssuerMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }

        tracing::debug!(issuer = %document.issuer, "resolved issuer metadata");
        Ok(document)
    }
}

fn well_known_url(issuer_url: &Url) -> Result<Url, DiscoveryError> {
    let base = issuer_url.as_str().trim_end_matches('/');
    Ok(format!("{base}/.well-known/openid-configuration").parse()?)
}
