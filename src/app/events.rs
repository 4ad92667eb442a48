// ABOUTME: Event handling system mapping keyboard input to calculator tokens and app actions

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::AppState;
use crate::calculator::InputToken;
use crate::models::Operator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Quit,
    ToggleHelp,
    Input(InputToken),
    Clear,
    ReloadSettings,
}

pub struct EventHandler;

impl EventHandler {
    pub fn handle_key_event(key_event: KeyEvent, state: &mut AppState) -> Option<AppEvent> {
        if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(AppEvent::Quit);
        }

        if state.help_visible {
            return match key_event.code {
                KeyCode::Char('?') | KeyCode::Esc => Some(AppEvent::ToggleHelp),
                _ => None,
            };
        }

        match key_event.code {
            KeyCode::Char('?') => Some(AppEvent::ToggleHelp),
            KeyCode::Char('q') | KeyCode::Esc => Some(AppEvent::Quit),
            KeyCode::Char('r') => Some(AppEvent::ReloadSettings),
            KeyCode::Char('c' | 'C') | KeyCode::Delete => Some(AppEvent::Clear),
            KeyCode::Enter | KeyCode::Char('=') => Some(AppEvent::Input(InputToken::Equals)),
            KeyCode::Backspace => Some(AppEvent::Input(InputToken::Backspace)),
            KeyCode::Char('n') => Some(AppEvent::Input(InputToken::ToggleSign)),
            KeyCode::Char('%') => Some(AppEvent::Input(InputToken::Percent)),
            KeyCode::Char('.' | ',') => Some(AppEvent::Input(InputToken::Decimal)),
            KeyCode::Char('+') => Some(AppEvent::Input(InputToken::Operator(Operator::Add))),
            KeyCode::Char('-') => Some(AppEvent::Input(InputToken::Operator(Operator::Sub))),
            KeyCode::Char('*' | 'x' | 'X') => {
                Some(AppEvent::Input(InputToken::Operator(Operator::Mul)))
            }
            KeyCode::Char('/') => Some(AppEvent::Input(InputToken::Operator(Operator::Div))),
            KeyCode::Char(ch) => ch
                .to_digit(10)
                .and_then(|d| u8::try_from(d).ok())
                .map(|d| AppEvent::Input(InputToken::Digit(d))),
            _ => None,
        }
    }

    pub fn process_event(event: AppEvent, state: &mut AppState) {
        match event {
            AppEvent::Quit => state.quit(),
            AppEvent::ToggleHelp => state.toggle_help(),
            AppEvent::Input(token) => state.input(token),
            AppEvent::Clear => state.clear(),
            AppEvent::ReloadSettings => {
                // Mark for async processing
                state.reload_settings();
            }
        }
    }
}
