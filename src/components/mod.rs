// ABOUTME: UI components for the calculator TUI: layout, keypad and help overlay

pub mod help;
pub mod keypad;
pub mod layout;

pub use help::HelpComponent;
pub use keypad::KeypadComponent;
pub use layout::LayoutComponent;
