// ABOUTME: Main layout component: record and display panel, connection status, keypad and bottom menu bar

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
};

use super::{HelpComponent, KeypadComponent};
use crate::app::{AppState, NotificationKind};
use crate::connection::ConnectionStatus;

pub struct LayoutComponent {
    keypad: KeypadComponent,
    help: HelpComponent,
}

impl LayoutComponent {
    pub fn new() -> Self {
        Self {
            keypad: KeypadComponent::new(),
            help: HelpComponent::new(),
        }
    }

    pub fn render(&mut self, frame: &mut Frame, state: &AppState) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Record + display
                Constraint::Length(3), // Connection status
                Constraint::Length(1), // Notification
                Constraint::Min(0),    // Keypad
                Constraint::Length(3), // Bottom menu bar
            ])
            .split(frame.size());

        self.render_display(frame, chunks[0], state);
        self.render_status(frame, chunks[1], state);
        self.render_notification(frame, chunks[2], state);
        self.keypad.render(frame, chunks[3], state);
        self.render_menu_bar(frame, chunks[4]);

        if state.help_visible {
            self.help.render(frame, frame.size());
        }
    }

    fn render_display(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let calculator = &state.calculator;
        let display_style = if calculator.session().showing_error {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        };

        let lines = vec![
            Line::from(Span::styled(
                calculator.record().to_string(),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(calculator.display().to_string(), display_style)),
        ];

        let panel = Paragraph::new(lines)
            .block(
                Block::default()
                    .title("netcalc")
                    .borders(Borders::LEFT | Borders::RIGHT | Borders::TOP)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .alignment(Alignment::Right);

        frame.render_widget(panel, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let color = match state.connection {
            ConnectionStatus::Online => Color::Green,
            ConnectionStatus::Connecting => Color::Yellow,
            ConnectionStatus::Offline => Color::Red,
        };

        let mut spans = vec![
            Span::styled("● ", Style::default().fg(color)),
            Span::styled(state.connection.label(), Style::default().fg(color)),
            Span::raw("  "),
            Span::styled(state.base_url.clone(), Style::default().fg(Color::Gray)),
        ];
        if state.calculator.is_evaluating() {
            spans.push(Span::styled("  computing...", Style::default().fg(Color::Yellow)));
        }

        let status = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

        frame.render_widget(status, area);
    }

    fn render_notification(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let Some(notification) = &state.notification else {
            return;
        };
        let color = match notification.kind {
            NotificationKind::Success => Color::Green,
            NotificationKind::Error => Color::Red,
            NotificationKind::Info => Color::Cyan,
            NotificationKind::Warning => Color::Yellow,
        };
        let line = Paragraph::new(notification.message.as_str())
            .style(Style::default().fg(color))
            .alignment(Alignment::Center);
        frame.render_widget(line, area);
    }

    fn render_menu_bar(&self, frame: &mut Frame, area: Rect) {
        let menu_text = "[0-9 . + - * /] input [Enter] = [n] ± [%] [c]lear [r]eload [?]help [q]uit";

        let menu = Paragraph::new(menu_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center);

        frame.render_widget(menu, area);
    }
}

impl Default for LayoutComponent {
    fn default() -> Self {
        Self::new()
    }
}
