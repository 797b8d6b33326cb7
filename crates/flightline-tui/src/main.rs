//! flightline - a terminal roster and promotion tracker.
//!
//! Keyboard-driven view of a flight's roster, supervision chart and
//! promotion eligibility, backed by a Realtime Database with a local cache
//! for offline work.

mod app;
mod config;
mod ui;
mod utils;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flightline_core::api::RealtimeDbClient;
use flightline_core::auth::CredentialStore;
use flightline_core::promotion::PromotionKind;
use flightline_core::{RosterService, SystemClock};

use app::{App, AppState};
use config::{Config, DATABASE_URL_ENV};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "flightline.log";

const USAGE: &str = "\
Usage: flightline [--sweep | --set-secret | --help]

  (no flag)      Start the terminal UI
  --sweep        Apply due promotions once and print what changed
  --set-secret   Store the database secret in the OS keychain";

fn env_filter() -> EnvFilter {
    // RUST_LOG controls the level (e.g. RUST_LOG=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to stderr, for the headless commands.
fn init_tracing_stderr() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

/// Log to a daily file, since the terminal UI owns the screen.
/// The returned guard flushes the writer when dropped.
fn init_tracing_file(dir: &Path) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    guard
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: ignoring unreadable config: {}", e);
        Config::default()
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--sweep") => {
            init_tracing_stderr();
            return run_sweep().await;
        }
        Some("--set-secret") => {
            init_tracing_stderr();
            return set_secret();
        }
        Some("--help") | Some("-h") => {
            println!("{}", USAGE);
            return Ok(());
        }
        Some(other) => {
            bail!("Unknown argument {}\n\n{}", other, USAGE);
        }
        None => {}
    }

    let config = load_config();
    let log_dir = config
        .cache_dir()
        .unwrap_or_else(|_| std::env::temp_dir().join(config::APP_NAME));
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: cannot create log directory {}: {}", log_dir.display(), e);
    }
    let _log_guard = init_tracing_file(&log_dir);
    info!("flightline starting");

    let mut app = App::new(config)?;

    // Show the cached roster right away, then refresh if it is old
    app.load_from_cache();
    if !app.offline_mode && app.is_cache_stale() {
        app.refresh_all_background();
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("flightline shutting down");
    Ok(())
}

/// Database client for the headless commands, authenticated when a secret is stored.
fn remote_client(config: &Config) -> Result<(String, RealtimeDbClient)> {
    let url = config.database_url().with_context(|| {
        format!(
            "No database URL configured. Set {} or add database_url to the config file.",
            DATABASE_URL_ENV
        )
    })?;

    let client = RealtimeDbClient::new(&url)?;
    let client = match CredentialStore::get(&url) {
        Ok(secret) => client.with_secret(secret),
        Err(e) => {
            warn!(error = %e, "No database secret available, continuing unauthenticated");
            client
        }
    };
    Ok((url, client))
}

/// Apply every promotion that is due today and print a summary.
async fn run_sweep() -> Result<()> {
    let config = load_config();
    let (url, client) = remote_client(&config)?;
    eprintln!("Running promotion sweep against {}...", url);

    let service = RosterService::new(client);
    let outcome = service.run_sweep(&SystemClock).await?;

    if outcome.promotions.is_empty() {
        println!("No promotions due.");
        return Ok(());
    }

    for record in &outcome.promotions {
        let kind = match record.kind {
            PromotionKind::Board => "board",
            PromotionKind::Automatic => "automatic",
        };
        println!(
            "{}: {} -> {} ({}, DOR {})",
            record.name, record.from, record.to, kind, record.dor
        );
    }
    println!("{} promotion(s) applied.", outcome.promotions.len());
    Ok(())
}

/// Prompt for the database secret and keep it in the OS keychain.
fn set_secret() -> Result<()> {
    let config = load_config();
    let url = config
        .database_url()
        .with_context(|| format!("Set {} or database_url in the config file first", DATABASE_URL_ENV))?;

    let secret = rpassword::prompt_password(format!("Database secret for {}: ", url))?;
    let secret = secret.trim();
    if secret.is_empty() {
        bail!("Secret cannot be empty");
    }

    CredentialStore::store(&url, secret)?;
    println!("Secret stored in the system keychain.");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
