// ABOUTME: Settings gateway persisting API settings and applying them to the live connection monitor
// The monitor is injected; there is no global settings-changed event

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::settings::{ApiSettings, SettingsError};
use super::store::SettingsStore;
use crate::connection::endpoint::{build_http_client, relaxed_tls};
use crate::connection::health::probe_health;
use crate::connection::{ConnectionMonitor, ProbeOutcome, TokenUpdate};

pub const TEST_TIMEOUT: Duration = Duration::from_secs(3);

pub struct SettingsGateway {
    store: SettingsStore,
    monitor: Arc<ConnectionMonitor>,
}

impl SettingsGateway {
    pub fn new(store: SettingsStore, monitor: Arc<ConnectionMonitor>) -> Self {
        Self { store, monitor }
    }

    pub fn settings_path(&self) -> &Path {
        self.store.path()
    }

    pub fn load(&self) -> ApiSettings {
        self.store.load()
    }

    /// Persist `settings`, then reconfigure the monitor with them. Returns
    /// whether the new endpoint answered its health check. A blank token
    /// keeps the token the monitor already has.
    pub async fn save_and_apply(&self, settings: &ApiSettings) -> Result<bool, SettingsError> {
        let base = self.store.save(settings)?;
        self.apply(base.as_str(), settings).await
    }

    /// Re-read the settings file and apply it without rewriting it.
    pub async fn reload(&self) -> Result<bool, SettingsError> {
        let settings = self.store.load();
        let base = settings.base_url()?;
        info!("Reloading settings from {:?}", self.store.path());
        self.apply(base.as_str(), &settings).await
    }

    async fn apply(&self, base: &str, settings: &ApiSettings) -> Result<bool, SettingsError> {
        let token = TokenUpdate::from_option(settings.token());
        let online = self.monitor.apply_settings(base, token).await?;
        Ok(online)
    }

    /// Probe `<base>/health` for `settings` with a throwaway client. Live
    /// state is left untouched.
    pub async fn test_connection(
        &self,
        settings: &ApiSettings,
    ) -> Result<ProbeOutcome, SettingsError> {
        test_connection(settings).await
    }
}

/// Standalone form of [`SettingsGateway::test_connection`] for callers
/// without a running monitor.
pub async fn test_connection(settings: &ApiSettings) -> Result<ProbeOutcome, SettingsError> {
    let base = settings.base_url()?;
    let client = build_http_client(TEST_TIMEOUT, relaxed_tls())
        .map_err(|e| SettingsError::Apply(e.into()))?;
    Ok(probe_health(&client, &base, settings.token()).await)
}
