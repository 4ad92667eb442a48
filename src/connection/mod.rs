// ABOUTME: Endpoint configuration, health probing and self-healing connection supervision

pub mod endpoint;
pub mod health;
pub mod monitor;

pub use endpoint::{Endpoint, EndpointError, EndpointHandle, TokenUpdate, DEFAULT_BASE_URL};
pub use health::ProbeOutcome;
pub use monitor::{ConnectionMonitor, ConnectionStatus, MonitorOptions};
