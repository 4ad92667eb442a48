// ABOUTME: Timed status-line notifications for connection changes, settings reloads and request failures

use std::time::{Duration, Instant};

use crate::client::{ComputeError, ErrorKind};

pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: Instant,
    pub duration: Duration,
}

impl Notification {
    pub fn new(message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at: Instant::now(),
            duration: DEFAULT_NOTIFICATION_DURATION,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Error)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Info)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Warning)
    }

    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Notification for a failed evaluation, when its class warrants one.
    pub fn for_compute_error(error: &ComputeError) -> Option<Self> {
        let notice = error.notice()?;
        Some(match error.kind() {
            ErrorKind::ConnectionLost => Self::warning(notice),
            _ => Self::error(notice),
        })
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_stay_on_the_display_only() {
        let rejected = ComputeError::Rejected {
            status: 400,
            message: "Invalid number.".into(),
        };
        assert!(Notification::for_compute_error(&rejected).is_none());

        let lost = Notification::for_compute_error(&ComputeError::ConnectionLost("reset".into()));
        assert_eq!(lost.map(|n| n.kind), Some(NotificationKind::Warning));
    }

    #[test]
    fn zero_duration_expires_immediately() {
        let n = Notification::info("hi").with_duration(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        assert!(n.is_expired());
    }
}
