// ABOUTME: User settings: JSON document, file store and the gateway that applies them

pub mod gateway;
pub mod settings;
pub mod store;

pub use gateway::{test_connection, SettingsGateway};
pub use settings::{ApiSettings, SettingsError, DEFAULT_SERVER_ADDRESS, DEFAULT_SERVER_PORT};
pub use store::{SettingsStore, SETTINGS_FILE_NAME};
