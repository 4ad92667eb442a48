// ABOUTME: Main entry point for the netcalc terminal calculator and its one-shot commands

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, Terminal};
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{info, warn};

use netcalc::app::{App, EventHandler};
use netcalc::cli::{Cli, Command, SettingsCommand};
use netcalc::client::{AuditLog, ComputeClient};
use netcalc::components::LayoutComponent;
use netcalc::config::{self, ApiSettings, SettingsGateway, SettingsStore};
use netcalc::connection::{
    ConnectionMonitor, Endpoint, EndpointHandle, MonitorOptions, ProbeOutcome,
};
use netcalc::models::{NumberFormat, Operator};

/// Everything wired together for one run.
struct Services {
    settings: ApiSettings,
    monitor: Arc<ConnectionMonitor>,
    client: Arc<ComputeClient>,
    gateway: Arc<SettingsGateway>,
    format: NumberFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_dir = cli.log_dir.clone().unwrap_or_else(default_log_dir);
    setup_logging(&log_dir)?;
    setup_panic_handler();

    let store = match cli.settings.clone().or_else(SettingsStore::default_path) {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::new(PathBuf::from(config::SETTINGS_FILE_NAME)),
    };

    match cli.command {
        None => {
            let services = build_services(&cli, store, &log_dir)?;
            let result = run_calculator(&services).await;
            services.monitor.shutdown();
            result
        }
        Some(Command::Eval {
            ref left,
            ref op,
            ref right,
        }) => {
            let operator = Operator::from_glyph(op)
                .with_context(|| format!("Unsupported operator '{op}'. Use one of +, -, *, /"))?;
            let services = build_services(&cli, store, &log_dir)?;
            let outcome = services.client.compute(left, right, operator).await;
            services.monitor.shutdown();
            match outcome {
                Ok(result) => {
                    println!("{result}");
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        }
        Some(Command::Settings { ref action }) => run_settings_command(&cli, action, store, &log_dir).await,
    }
}

fn build_services(cli: &Cli, store: SettingsStore, log_dir: &Path) -> Result<Services> {
    let settings = store.load();
    let base_url = match &cli.base_url {
        Some(url) => url.clone(),
        None => settings.base_url()?.to_string(),
    };
    let token = cli
        .token
        .clone()
        .or_else(|| settings.token().map(str::to_string));

    let endpoint = Endpoint::from_settings(&base_url, token)
        .with_context(|| format!("Invalid base URL '{base_url}'"))?;
    info!("Using compute endpoint {}", endpoint.base_url());

    let monitor = ConnectionMonitor::new(EndpointHandle::new(endpoint), MonitorOptions::default());

    let audit = match AuditLog::open(&log_dir.join("audit.jsonl")) {
        Ok(audit) => audit,
        Err(e) => {
            warn!("Audit log disabled: {}", e);
            AuditLog::disabled()
        }
    };

    let format = NumberFormat::from_env();
    let client = Arc::new(
        ComputeClient::new(Arc::clone(&monitor), Arc::new(audit), format).with_route(cli.route.into()),
    );
    let gateway = Arc::new(SettingsGateway::new(store, Arc::clone(&monitor)));

    Ok(Services {
        settings,
        monitor,
        client,
        gateway,
        format,
    })
}

async fn run_settings_command(
    cli: &Cli,
    action: &SettingsCommand,
    store: SettingsStore,
    log_dir: &Path,
) -> Result<()> {
    match action {
        SettingsCommand::Show => {
            let settings = store.load();
            println!("Settings file: {}", store.path().display());
            println!("Server address: {}", settings.server_address);
            println!("Server port:    {}", settings.server_port);
            println!(
                "Token:          {}",
                if settings.token().is_some() { "(set)" } else { "(none)" }
            );
            match settings.base_url() {
                Ok(url) => println!("Base URL:       {url}"),
                Err(e) => println!("Base URL:       invalid ({e})"),
            }
            Ok(())
        }
        SettingsCommand::Set {
            address,
            port,
            token,
        } => {
            let services = build_services(cli, store, log_dir)?;
            let mut settings = services.settings.clone();
            if let Some(address) = address {
                settings.server_address.clone_from(address);
            }
            if let Some(port) = port {
                settings.server_port = *port;
            }
            if let Some(token) = token {
                settings.token = Some(token.clone()).filter(|t| !t.trim().is_empty());
            }

            let outcome = services.gateway.save_and_apply(&settings).await;
            services.monitor.shutdown();
            let online = outcome.context("Failed to save settings")?;
            println!("Saved {}", services.gateway.settings_path().display());
            println!(
                "Server {}",
                if online { "is reachable" } else { "is not reachable" }
            );
            Ok(())
        }
        SettingsCommand::Test => {
            let settings = store.load();
            match config::test_connection(&settings).await? {
                ProbeOutcome::Reachable => println!("Server connection succeeded"),
                ProbeOutcome::Status(code) => println!("Server responded: {code}"),
                ProbeOutcome::Unreachable(reason) => {
                    anyhow::bail!("Cannot reach the server: {reason}")
                }
            }
            Ok(())
        }
    }
}

async fn run_calculator(services: &Services) -> Result<()> {
    let mut app = App::new(
        Arc::clone(&services.client) as Arc<dyn netcalc::calculator::Evaluator>,
        Arc::clone(&services.monitor),
        Arc::clone(&services.gateway),
        services.format,
    );
    app.init();
    let mut layout = LayoutComponent::new();

    run_tui(&mut app, &mut layout).await
}

async fn run_tui(app: &mut App, layout: &mut LayoutComponent) -> Result<()> {
    if let Err(e) = crossterm::terminal::is_raw_mode_enabled() {
        eprintln!("Cannot check terminal raw mode: {}", e);
        return Err(anyhow::anyhow!("Terminal not compatible: {}", e));
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| {
            layout.render(frame, &app.state);
        })?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key_event) = event::read()? {
                if let Some(app_event) = EventHandler::handle_key_event(key_event, &mut app.state) {
                    EventHandler::process_event(app_event, &mut app.state);
                }
            }
        }

        // Async work spawned from ticks needs the runtime to make progress.
        tokio::task::yield_now().await;
        app.tick();
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.state.should_quit {
            break;
        }
    }

    app.shutdown();
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(())
}

fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".netcalc").join("logs"))
        .unwrap_or_else(|| PathBuf::from(".netcalc/logs"))
}

fn setup_logging(log_dir: &Path) -> Result<()> {
    use std::fs::OpenOptions;
    use tracing_subscriber::prelude::*;

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let log_file = log_dir.join(format!(
        "netcalc-{}.log",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .with_context(|| format!("Failed to create log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(file)
                .with_ansi(false), // No ANSI colors in log file
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netcalc=info".into()),
        )
        .init();

    Ok(())
}

fn setup_panic_handler() {
    use tracing::error;

    std::panic::set_hook(Box::new(|panic_info| {
        // Ensure terminal is restored before logging the panic
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stderr(), LeaveAlternateScreen, DisableMouseCapture);

        error!("Application panicked: {}", panic_info);
        eprintln!("Application panicked: {}", panic_info);
        eprintln!("Please check the logs for more details.");
    }));
}
