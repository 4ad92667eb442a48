// ABOUTME: Main application structure and state management for the terminal calculator

pub mod events;
pub mod notification;
pub mod state;

pub use events::{AppEvent, EventHandler};
pub use notification::{Notification, NotificationKind};
pub use state::{App, AppState, AsyncAction};
