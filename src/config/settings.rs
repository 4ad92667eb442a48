// ABOUTME: API settings (server address, port, token) and their on-disk JSON document shape
// Resolves the compute base URL `{scheme}://{host}:{port}/calc/` from user-entered values

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::connection::EndpointError;

pub const DEFAULT_SERVER_ADDRESS: &str = "https://localhost";
pub const DEFAULT_SERVER_PORT: u32 = 5001;
const BASE_PATH: &str = "calc/";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Port must be an integer between 1 and 65535 (got {0})")]
    InvalidPort(u32),

    #[error("Server address is empty")]
    EmptyAddress,

    #[error("Invalid server address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to access settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to apply settings: {0}")]
    Apply(#[from] EndpointError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub server_address: String,
    pub server_port: u32,
    /// `None` or blank means no token.
    pub token: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            token: None,
        }
    }
}

impl ApiSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(1..=u32::from(u16::MAX)).contains(&self.server_port) {
            return Err(SettingsError::InvalidPort(self.server_port));
        }
        if self.server_address.trim().is_empty() {
            return Err(SettingsError::EmptyAddress);
        }
        Ok(())
    }

    /// The token to send, with blanks treated as absent.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Resolve the compute base URL. An address without an http/https
    /// scheme is taken as a host name reached over https.
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        self.validate()?;

        let raw = self.server_address.trim().trim_end_matches(['/', ':']);
        let (scheme, host) = match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => match url.host_str() {
                Some(host) => (url.scheme().to_string(), host.to_string()),
                None => ("https".to_string(), raw.to_string()),
            },
            _ => ("https".to_string(), raw.to_string()),
        };

        let candidate = format!("{scheme}://{host}:{}/{BASE_PATH}", self.server_port);
        Url::parse(&candidate).map_err(|source| SettingsError::InvalidAddress {
            address: self.server_address.clone(),
            source,
        })
    }

    pub(crate) fn from_document(doc: &SettingsDocument) -> Self {
        let mut settings = Self::default();
        let Some(api) = &doc.api_settings else {
            return settings;
        };

        let mut address = api
            .server_address
            .clone()
            .filter(|a| !a.trim().is_empty());
        let mut port = api.server_port.filter(|p| *p > 0);

        if address.is_none() || port.is_none() {
            let from_base = api
                .base_url
                .as_deref()
                .and_then(|base| Url::parse(base.trim()).ok())
                .and_then(|url| {
                    let host = url.host_str()?.to_string();
                    Some((format!("{}://{host}", url.scheme()), url.port_or_known_default()?))
                });
            if let Some((base_address, base_port)) = from_base {
                address = Some(base_address);
                port = Some(u32::from(base_port));
            }
        }

        if let Some(address) = address {
            settings.server_address = address;
        }
        if let Some(port) = port {
            settings.server_port = port;
        }
        settings.token = api.token.clone().filter(|t| !t.trim().is_empty());
        settings
    }

    /// Document written back to disk: all four fields, with address and
    /// port normalized from the resolved base URL.
    pub(crate) fn to_document(&self) -> Result<SettingsDocument, SettingsError> {
        let base = self.base_url()?;
        let server_address = match base.host_str() {
            Some(host) => format!("{}://{host}", base.scheme()),
            None => self.server_address.clone(),
        };
        let server_port = base
            .port_or_known_default()
            .map_or(self.server_port, u32::from);

        Ok(SettingsDocument {
            api_settings: Some(DocumentApiSettings {
                base_url: Some(base.to_string()),
                server_address: Some(server_address),
                server_port: Some(server_port),
                token: Some(self.token.clone().unwrap_or_default()),
            }),
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SettingsDocument {
    #[serde(default)]
    pub api_settings: Option<DocumentApiSettings>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DocumentApiSettings {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub server_address: Option<String>,
    #[serde(default)]
    pub server_port: Option<u32>,
    #[serde(default)]
    pub token: Option<String>,
}
