//! Taskdesk: terminal client for the Taskdesk task manager.
//!
//! Launches the TUI and talks to the task API in the background.
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/taskdesk/config.toml`).
//!
//! ```bash
//! # Against a local server
//! cargo run --bin taskdesk
//!
//! # Against another server
//! cargo run --bin taskdesk -- --api-url http://tasks.internal:5000/api
//! TASKDESK_API_URL=http://tasks.internal:5000/api cargo run --bin taskdesk
//! ```

use std::io;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use taskdesk::app::App;
use taskdesk::config::{CliArgs, ClientConfig};
use taskdesk::net::{self, NetCommand, NetEvent};
use taskdesk::ui;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(api_url = %config.api_url, "taskdesk starting");

    let (cmd_tx, evt_rx) = match net::spawn_net(&config.to_net_config()) {
        Ok(handles) => handles,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run_terminal(cmd_tx, evt_rx, &config) {
        Ok(()) => {
            tracing::info!("taskdesk exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "terminal error");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Set up the terminal, run the app, and restore the terminal even if the
/// app fails.
fn run_terminal(
    cmd_tx: mpsc::Sender<NetCommand>,
    evt_rx: mpsc::Receiver<NetEvent>,
    config: &ClientConfig,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &cmd_tx, evt_rx, config);

    let _ = cmd_tx.try_send(NetCommand::Shutdown);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the terminal).
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskdesk.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Main application loop: draw, apply data events, handle one key.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    cmd_tx: &mpsc::Sender<NetCommand>,
    mut evt_rx: mpsc::Receiver<NetEvent>,
    config: &ClientConfig,
) -> io::Result<()> {
    let mut app = App::new(config.date_format.clone());
    let connect = app.connect_command();
    dispatch(&mut app, cmd_tx, connect);

    loop {
        // Step 1: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 2: Drain all pending NetEvents (non-blocking).
        while let Ok(event) = evt_rx.try_recv() {
            app.apply_event(event);
        }

        // Step 3: Poll for terminal input events.
        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(cmd) = app.handle_key_event(key) {
                dispatch(&mut app, cmd_tx, cmd);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Hand a command to the data task without blocking the UI.
fn dispatch(app: &mut App, tx: &mpsc::Sender<NetCommand>, cmd: NetCommand) {
    match tx.try_send(cmd) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::warn!("command channel full");
            app.push_error("Busy, try again");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::error!("data task is gone");
            app.push_error("Background worker stopped, restart taskdesk");
        }
    }
}
