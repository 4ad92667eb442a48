// ABOUTME: Error types for remote compute requests
// Each variant maps to one class of the failure taxonomy and its retry policy

use thiserror::Error;

/// Coarse failure class used for policy decisions (notify, retry, ignore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    Server,
    ConnectionLost,
    Protocol,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ComputeError {
    /// The server refused the request (bad operand, bad operator, divide by
    /// zero, or any other non-success status below 500 except 401).
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Server error (HTTP {status})")]
    Server { status: u16 },

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ComputeError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Rejected { .. } => ErrorKind::Validation,
            Self::Unauthorized { .. } => ErrorKind::Auth,
            Self::Server { .. } => ErrorKind::Server,
            Self::ConnectionLost(_) => ErrorKind::ConnectionLost,
            Self::UnexpectedResponse(_) => ErrorKind::Protocol,
        }
    }

    /// Short text placed on the calculator display.
    pub fn display_text(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Unauthorized { .. } => "Authentication failed".to_string(),
            Self::Server { .. } => "Server error".to_string(),
            Self::ConnectionLost(_) => "Connection error".to_string(),
            Self::UnexpectedResponse(_) => "Unexpected response".to_string(),
        }
    }

    /// Longer explanation for a notification, if this class warrants one.
    pub fn notice(&self) -> Option<&'static str> {
        match self.kind() {
            ErrorKind::Auth => Some("Authentication failed. Check the token in your settings."),
            ErrorKind::Server => {
                Some("The server hit a temporary problem. Please try again later.")
            }
            ErrorKind::ConnectionLost => {
                Some("Connection to the server was lost. Reconnecting...")
            }
            ErrorKind::Validation | ErrorKind::Protocol => None,
        }
    }

    /// Only transport failures feed the self-healing retry loop.
    pub fn triggers_reconnect(&self) -> bool {
        self.kind() == ErrorKind::ConnectionLost
    }
}
