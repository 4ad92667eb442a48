// ABOUTME: Keypad grid showing the calculator buttons, dimmed while the server is unreachable

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::AppState;

const ROWS: [[&str; 4]; 5] = [
    ["%", "C", "←", "÷"],
    ["7", "8", "9", "×"],
    ["4", "5", "6", "-"],
    ["1", "2", "3", "+"],
    ["±", "0", ".", "="],
];

pub struct KeypadComponent;

impl KeypadComponent {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let enabled = state.is_online();
        let separator = state.calculator.format().decimal_separator().to_string();

        let lines: Vec<Line> = ROWS
            .iter()
            .map(|row| {
                let spans: Vec<Span> = row
                    .iter()
                    .map(|label| {
                        let label: &str = if *label == "." { &separator } else { *label };
                        Span::styled(format!("[ {label} ]"), Self::key_style(label, enabled))
                    })
                    .collect();
                Line::from(spans)
            })
            .collect();

        let title = if enabled { "Keypad" } else { "Keypad (offline)" };
        let keypad = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .alignment(Alignment::Center);

        frame.render_widget(keypad, area);
    }

    fn key_style(label: &str, enabled: bool) -> Style {
        if !enabled {
            return Style::default().fg(Color::DarkGray);
        }
        match label {
            "=" => Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
            "+" | "-" | "×" | "÷" => Style::default().fg(Color::Yellow),
            "%" | "C" | "←" | "±" => Style::default().fg(Color::Magenta),
            _ => Style::default().fg(Color::White),
        }
    }
}

impl Default for KeypadComponent {
    fn default() -> Self {
        Self::new()
    }
}
