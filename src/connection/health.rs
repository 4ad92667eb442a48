// ABOUTME: Health probe against {base}/health with a one-shot HTTPS fallback for plain-HTTP bases

use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::endpoint::{build_http_client, relaxed_tls, Endpoint};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable,
    Status(u16),
    Unreachable(String),
}

impl ProbeOutcome {
    pub const fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable)
    }
}

/// Single GET against `<base>/health`; any 2xx counts as reachable.
pub async fn probe_health(client: &Client, base: &Url, token: Option<&str>) -> ProbeOutcome {
    let url = match base.join("health") {
        Ok(url) => url,
        Err(e) => return ProbeOutcome::Unreachable(e.to_string()),
    };

    let mut request = client.get(url.clone());
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    match request.send().await {
        Ok(resp) if resp.status().is_success() => {
            debug!("Health check {} -> {}", url, resp.status());
            ProbeOutcome::Reachable
        }
        Ok(resp) => {
            debug!("Health check {} -> {}", url, resp.status());
            ProbeOutcome::Status(resp.status().as_u16())
        }
        Err(e) => {
            debug!("Health check {} failed: {}", url, e);
            ProbeOutcome::Unreachable(e.to_string())
        }
    }
}

/// The same host and port over https, or `None` when the base is already secure.
pub fn secure_equivalent(base: &Url) -> Option<Url> {
    if base.scheme() == "https" {
        return None;
    }
    let port = base.port_or_known_default();
    let mut secure = base.clone();
    secure.set_scheme("https").ok()?;
    secure.set_port(port).ok()?;
    Some(secure)
}

/// Decide reachability of the endpoint. A failed plain-HTTP probe is retried
/// once over HTTPS with a throwaway client.
pub async fn check_connection(endpoint: &Endpoint, timeout: Duration) -> bool {
    let primary = probe_health(endpoint.http(), endpoint.base_url(), endpoint.token()).await;
    if primary.is_reachable() {
        return true;
    }

    let Some(secure) = secure_equivalent(endpoint.base_url()) else {
        return false;
    };

    debug!("Trying fallback HTTPS base: {}", secure);
    let client = match build_http_client(timeout, relaxed_tls()) {
        Ok(client) => client,
        Err(e) => {
            debug!("Could not build fallback client: {}", e);
            return false;
        }
    };

    probe_health(&client, &secure, endpoint.token())
        .await
        .is_reachable()
}
