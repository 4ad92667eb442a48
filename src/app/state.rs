// ABOUTME: Application state for the terminal calculator and the App that runs its async work
// AppState is the single owner of the calculator session; network results are marshaled back through a channel

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::notification::Notification;
use crate::calculator::{EvalRequest, Evaluator, ExpressionMachine, InputToken, Step};
use crate::client::ComputeError;
use crate::config::{SettingsError, SettingsGateway};
use crate::connection::{ConnectionMonitor, ConnectionStatus};
use crate::models::NumberFormat;

pub const CONNECTING_TEXT: &str = "Connecting...";
pub const CONNECTION_ERROR_TEXT: &str = "Connection error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncAction {
    Evaluate(EvalRequest),
    ReloadSettings,
}

#[derive(Debug)]
pub struct AppState {
    pub calculator: ExpressionMachine,
    pub connection: ConnectionStatus,
    pub base_url: String,
    pub notification: Option<Notification>,
    pub should_quit: bool,
    pub help_visible: bool,
    // Async action processing
    pub pending_async_action: Option<AsyncAction>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(NumberFormat::invariant())
    }
}

impl AppState {
    pub fn new(format: NumberFormat) -> Self {
        let mut calculator = ExpressionMachine::new(format);
        calculator.show_message(CONNECTING_TEXT);
        Self {
            calculator,
            connection: ConnectionStatus::Connecting,
            base_url: String::new(),
            notification: None,
            should_quit: false,
            help_visible: false,
            pending_async_action: None,
        }
    }

    pub fn is_online(&self) -> bool {
        self.connection == ConnectionStatus::Online
    }

    pub fn toggle_help(&mut self) {
        self.help_visible = !self.help_visible;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notification = Some(notification);
    }

    /// Feed a keypad token. Ignored while the server is not reachable.
    pub fn input(&mut self, token: InputToken) {
        if !self.is_online() {
            debug!("Ignoring {:?} while {}", token, self.connection.label());
            self.notify(Notification::warning(
                "The server is not reachable. Input is disabled until it reconnects.",
            ));
            return;
        }

        let step = self.calculator.input(token);
        self.schedule(step);
    }

    pub fn clear(&mut self) {
        if !self.is_online() {
            return;
        }
        self.calculator.reset();
    }

    pub fn reload_settings(&mut self) {
        self.pending_async_action = Some(AsyncAction::ReloadSettings);
        self.notify(Notification::info("Reloading settings..."));
    }

    /// Hand an evaluation outcome back to the calculator.
    pub fn evaluation_finished(&mut self, request: EvalRequest, outcome: Result<String, ComputeError>) {
        if let Err(e) = &outcome {
            if let Some(notification) = Notification::for_compute_error(e) {
                self.notify(notification);
            }
        }
        let step = self.calculator.complete(request, outcome);
        self.schedule(step);
    }

    pub fn connection_changed(&mut self, status: ConnectionStatus) {
        if self.connection == status {
            return;
        }
        info!("Connection status: {} -> {}", self.connection.label(), status.label());
        self.connection = status;
        match status {
            ConnectionStatus::Online => {
                self.calculator.reset_display();
                self.notify(Notification::success("Connected to the server"));
            }
            ConnectionStatus::Offline => {
                self.calculator.show_message(CONNECTION_ERROR_TEXT);
            }
            ConnectionStatus::Connecting => {
                self.calculator.show_message(CONNECTING_TEXT);
            }
        }
    }

    pub fn settings_applied(&mut self, outcome: Result<bool, SettingsError>) {
        match outcome {
            Ok(true) => {
                self.calculator.reset_display();
                self.notify(Notification::success("Settings applied"));
            }
            Ok(false) => {
                self.calculator.show_message(CONNECTION_ERROR_TEXT);
                self.notify(Notification::warning(
                    "Settings applied, but the server is not reachable",
                ));
            }
            Err(e) => {
                warn!("Failed to apply settings: {}", e);
                self.notify(Notification::error(format!("Settings not applied: {e}")));
            }
        }
    }

    pub fn expire_notification(&mut self) {
        if self.notification.as_ref().is_some_and(Notification::is_expired) {
            self.notification = None;
        }
    }

    fn schedule(&mut self, step: Step) {
        if let Step::Evaluate(request) = step {
            self.pending_async_action = Some(AsyncAction::Evaluate(request));
        }
    }
}

enum TaskResult {
    Evaluated(EvalRequest, Result<String, ComputeError>),
    SettingsApplied(Result<bool, SettingsError>),
}

pub struct App {
    pub state: AppState,
    evaluator: Arc<dyn Evaluator>,
    monitor: Arc<ConnectionMonitor>,
    settings: Arc<SettingsGateway>,
    status_rx: watch::Receiver<ConnectionStatus>,
    results_tx: mpsc::UnboundedSender<TaskResult>,
    results_rx: mpsc::UnboundedReceiver<TaskResult>,
}

impl App {
    pub fn new(
        evaluator: Arc<dyn Evaluator>,
        monitor: Arc<ConnectionMonitor>,
        settings: Arc<SettingsGateway>,
        format: NumberFormat,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let mut state = AppState::new(format);
        state.base_url = monitor.endpoint().current().base_url().to_string();
        Self {
            state,
            status_rx: monitor.subscribe(),
            evaluator,
            monitor,
            settings,
            results_tx,
            results_rx,
        }
    }

    /// Start the initial connection check in the background.
    pub fn init(&mut self) {
        let monitor = Arc::clone(&self.monitor);
        tokio::spawn(async move {
            monitor.initialize().await;
        });
    }

    /// Run queued async work, apply finished results and react to connection changes.
    pub fn tick(&mut self) {
        self.process_async_action();

        while let Ok(result) = self.results_rx.try_recv() {
            match result {
                TaskResult::Evaluated(request, outcome) => {
                    self.state.evaluation_finished(request, outcome);
                }
                TaskResult::SettingsApplied(outcome) => {
                    self.state.base_url = self.monitor.endpoint().current().base_url().to_string();
                    self.state.settings_applied(outcome);
                }
            }
        }
        // A finished evaluation may have queued the next one.
        self.process_async_action();

        if self.status_rx.has_changed().unwrap_or(false) {
            let status = *self.status_rx.borrow_and_update();
            self.state.connection_changed(status);
        }

        self.state.expire_notification();
    }

    fn process_async_action(&mut self) {
        let Some(action) = self.state.pending_async_action.take() else {
            return;
        };
        let tx = self.results_tx.clone();

        match action {
            AsyncAction::Evaluate(request) => {
                let evaluator = Arc::clone(&self.evaluator);
                tokio::spawn(async move {
                    let outcome = evaluator
                        .evaluate(&request.left, &request.right, request.operator)
                        .await;
                    let _ = tx.send(TaskResult::Evaluated(request, outcome));
                });
            }
            AsyncAction::ReloadSettings => {
                let settings = Arc::clone(&self.settings);
                tokio::spawn(async move {
                    let outcome = settings.reload().await;
                    let _ = tx.send(TaskResult::SettingsApplied(outcome));
                });
            }
        }
    }

    pub fn shutdown(&self) {
        self.monitor.shutdown();
    }
}
