use serde::Deserialize;
use url::Url;

use crate::error::ExchangeError;

/// Token response from the issuer's token endpoint.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Absent when the provider does not rotate refresh tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// OAuth error body (RFC 6749 section 5.2).
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Stateless client for the OAuth2 refresh-token grant.
///
/// Holds no session state; every call is one independent network round trip.
/// Protocol-level rejection never surfaces as a transport error — see
/// [`ExchangeError`].
pub struct TokenExchangeClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl TokenExchangeClient {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Exchange a refresh token for a new token set.
    ///
    /// Issues one `application/x-www-form-urlencoded` POST with
    /// `grant_type=refresh_token`.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Transport`] on network/TLS failure or an
    /// unreadable success body, and [`ExchangeError::Rejected`] when the
    /// endpoint returns an OAuth error response (e.g. `invalid_grant` for an
    /// expired or revoked refresh token).
    pub async fn exchange_refresh_token(
        &self,
        token_endpoint: &Url,
        refresh_token: &str,
    ) -> Result<TokenResponse, ExchangeError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(token_endpoint.clone())
            .form(&params)
            .send()
            .await?;

        if response.status().is_success() {
            return response
                .json::<TokenResponse>()
                .await
                .map_err(ExchangeError::Transport);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(parse_rejection(status, &body))
    }
}

/// Map a non-2xx token endpoint response to a rejection.
///
/// Falls back to the HTTP status when the body is not an OAuth error
/// document, so the caller always gets a machine-readable `error` code.
fn parse_rejection(status: u16, body: &str) -> ExchangeError {
    match serde_json::from_str::<OAuthErrorBody>(body) {
        Ok(err) => ExchangeError::Rejected {
            error: err.error,
            description: err.error_description,
        },
        Err(_) => ExchangeError::Rejected {
            error: format!("http_{status}"),
            description: (!body.is_empty()).then(|| body.to_string()),
        },
    }
}
