use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use url::Url;

use crate::error::ConfigError;

/// Builds per-call API clients carrying a bearer token.
///
/// Pure configuration: no network access, no state beyond its inputs. Each
/// [`build`](Self::build) call produces an immutable, fully configured
/// client value — there is no long-lived mutable client whose headers get
/// reset between calls, so concurrent callers cannot observe each other's
/// tokens.
#[derive(Debug, Clone)]
pub struct ApiClientBuilder {
    base_url: Url,
    timeout: Option<std::time::Duration>,
}

impl ApiClientBuilder {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Produce a client with the bearer token and `Accept: application/json`
    /// attached to every request.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBearerToken`] if the token contains
    /// bytes illegal in an HTTP header, or [`ConfigError::HttpClient`] if
    /// the client cannot be constructed.
    pub fn build(&self, access_token: &str) -> Result<ApiClient, ConfigError> {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|_| ConfigError::InvalidBearerToken)?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ConfigError::HttpClient)?;

        Ok(ApiClient {
            http,
            base_url: self.base_url.clone(),
        })
    }
}

/// A configured client for one protected API, bound to one access token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client (bearer token already attached).
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Start a GET request for a path relative to the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if the path does not join onto the base
    /// URL.
    pub fn get(&self, path: &str) -> Result<reqwest::RequestBuilder, url::ParseError> {
        Ok(self.http.get(self.base_url.join(path)?))
    }

    /// Start a POST request for a path relative to the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if the path does not join onto the base
    /// URL.
    pub fn post(&self, path: &str) -> Result<reqwest::RequestBuilder, url::ParseError> {
        Ok(self.http.post(self.base_url.join(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_client_with_base_url() {
        let client = ApiClientBuilder::new("https://api.example.com/".parse().unwrap())
            .build("tok1")
            .unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.example.com/");
    }

    #[test]
    fn each_build_is_independent() {
        let builder = ApiClientBuilder::new("https://api.example.com/".parse().unwrap());
        // Two tokens, two clients; neither mutates the other.
        let _a = builder.build("tok-a").unwrap();
        let _b = builder.build("tok-b").unwrap();
    }

    #[test]
    fn token_with_illegal_header_bytes_is_rejected() {
        let builder = ApiClientBuilder::new("https://api.example.com/".parse().unwrap());
        assert!(matches!(
            builder.build("tok\nwith-newline"),
            Err(ConfigError::InvalidBearerToken)
        ));
    }

    #[test]
    fn relative_paths_join_onto_base() {
        let client = ApiClientBuilder::new("https://api.example.com/v1/".parse().unwrap())
            .build("tok1")
            .unwrap();
        let request = client.get("images").unwrap().build().unwrap();
        assert_eq!(request.url().as_str(), "https://api.example.com/v1/images");
    }
}
