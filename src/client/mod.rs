// ABOUTME: Remote compute client, its wire protocol, error taxonomy and audit trail

pub mod audit;
pub mod compute;
pub mod error;
pub mod protocol;

pub use audit::AuditLog;
pub use compute::ComputeClient;
pub use error::{ComputeError, ErrorKind};
pub use protocol::{ComputeRequest, ComputeResponse, ComputeRoute};
