// ABOUTME: Shared endpoint configuration (base URL, bearer token, HTTP client) for one configuration epoch
// Reconfiguration swaps the whole endpoint; requests keep the snapshot they started with

use reqwest::{Client, RequestBuilder};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://localhost:5001/calc/";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("Base URL is empty")]
    EmptyUrl,

    #[error("Invalid base URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// How a settings change affects the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenUpdate {
    Keep,
    Clear,
    Replace(String),
}

impl TokenUpdate {
    /// `None` keeps the current token, `""` clears it, anything else replaces it.
    pub fn from_option(token: Option<&str>) -> Self {
        match token {
            None => Self::Keep,
            Some(t) if t.is_empty() => Self::Clear,
            Some(t) => Self::Replace(t.to_string()),
        }
    }

    pub fn apply(self, current: Option<&str>) -> Option<String> {
        match self {
            Self::Keep => current.map(str::to_string),
            Self::Clear => None,
            Self::Replace(token) => Some(token),
        }
    }
}

/// Parse a base URL and guarantee the trailing separator so relative joins
/// (`health`, `compute`) land under it.
pub fn normalize_base_url(raw: &str) -> Result<Url, EndpointError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EndpointError::EmptyUrl);
    }

    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };

    let url = Url::parse(&with_slash).map_err(|source| EndpointError::InvalidUrl {
        url: trimmed.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(EndpointError::UnsupportedScheme(other.to_string())),
    }
}

/// Self-signed development servers are accepted only in debug builds.
pub const fn relaxed_tls() -> bool {
    cfg!(debug_assertions)
}

pub fn build_http_client(timeout: Duration, relaxed_tls: bool) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(relaxed_tls)
        .build()
}

#[derive(Debug)]
pub struct Endpoint {
    base_url: Url,
    token: Option<String>,
    http: Client,
    epoch: u64,
}

impl Endpoint {
    pub fn new(
        base_url: Url,
        token: Option<String>,
        timeout: Duration,
        epoch: u64,
    ) -> Result<Self, EndpointError> {
        Ok(Self {
            base_url,
            token: token.filter(|t| !t.trim().is_empty()),
            http: build_http_client(timeout, relaxed_tls())?,
            epoch,
        })
    }

    pub fn from_settings(base_url: &str, token: Option<String>) -> Result<Self, EndpointError> {
        Self::new(normalize_base_url(base_url)?, token, REQUEST_TIMEOUT, 0)
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub const fn http(&self) -> &Client {
        &self.http
    }

    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn join(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }

    /// Attach the bearer header when a token is configured.
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Handle to the current [`Endpoint`], shared by the compute client and the
/// connection monitor.
#[derive(Debug, Clone)]
pub struct EndpointHandle {
    inner: Arc<RwLock<Arc<Endpoint>>>,
}

impl EndpointHandle {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(endpoint))),
        }
    }

    pub fn current(&self) -> Arc<Endpoint> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Install a new endpoint and hand back the previous one.
    pub fn replace(&self, endpoint: Endpoint) -> Arc<Endpoint> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(endpoint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_appends_trailing_slash() {
        let url = normalize_base_url("http://127.0.0.1:5000/calc").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/calc/");
        assert_eq!(url.join("health").unwrap().path(), "/calc/health");
    }

    #[test]
    fn normalize_rejects_other_schemes() {
        assert!(matches!(
            normalize_base_url("ftp://example.com"),
            Err(EndpointError::UnsupportedScheme(_))
        ));
        assert!(matches!(normalize_base_url("   "), Err(EndpointError::EmptyUrl)));
    }

    #[test]
    fn token_update_semantics() {
        assert_eq!(TokenUpdate::from_option(None).apply(Some("old")), Some("old".to_string()));
        assert_eq!(TokenUpdate::from_option(Some("")).apply(Some("old")), None);
        assert_eq!(
            TokenUpdate::from_option(Some("new")).apply(Some("old")),
            Some("new".to_string())
        );
    }

    #[test]
    fn blank_token_is_not_sent() {
        let endpoint = Endpoint::from_settings("http://localhost:5001/calc/", Some("  ".into())).unwrap();
        assert_eq!(endpoint.token(), None);
    }
}
