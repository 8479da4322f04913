//! BG1 - a terminal client for Disney virtual queues.
//!
//! Shows the queue list for a resort next to a park clock that is watched
//! for liveness. Usage:
//!
//! ```text
//! bg1            run the TUI
//! bg1 --demo     run the TUI with an in-memory session and canned queues
//! bg1 --login    store a credential from the terminal
//! bg1 --logout   remove the stored credential
//! ```

mod app;
mod ui;

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bg1_core::auth::{Credential, CredentialStore, SessionController};
use bg1_core::config::Config;

use app::{build_store, App, AppState, LoginForm};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name in cache directory
const LOG_FILE: &str = "bg1.log";

/// Initialize the tracing subscriber writing to the log file.
///
/// The terminal is in alternate-screen mode, so nothing goes to stderr.
/// Use RUST_LOG to control the level (e.g. RUST_LOG=bg1_core=debug).
fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create {}", log_dir.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load();
    let cache_dir = config.cache_dir()?;
    let _log_guard = init_tracing(&cache_dir)?;

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    let demo = args.iter().any(|a| a == "--demo");
    if args.iter().any(|a| a == "--login") {
        return login_from_terminal(&config, &cache_dir);
    }
    if args.iter().any(|a| a == "--logout") {
        let store = build_store(&config, cache_dir.clone(), false);
        store.delete_data().context("Failed to remove stored credential")?;
        println!("Logged out.");
        return Ok(());
    }

    info!(location = %config.location, demo, "BG1 starting");

    // Resolve the session before touching the terminal so store errors print plainly
    let mut app = App::new(config, cache_dir, demo)?;
    app.start_session().await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;
    app.shutdown().await;

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

    info!("BG1 shutting down");
    Ok(())
}

/// Store a credential entered on the plain terminal
fn login_from_terminal(config: &Config, cache_dir: &Path) -> Result<()> {
    println!("\n=== BG1 Login ===\n");

    let session = SessionController::new(build_store(config, cache_dir.to_path_buf(), false));
    session.initialize()?;
    if let Some(current) = session.active_credential() {
        println!("Replacing stored credential for {}", current.subject);
        session.logout()?;
    }

    let form = LoginForm {
        swid: prompt("SWID: ")?,
        token: rpassword::prompt_password("Access token: ")?,
        lifetime: prompt("Lifetime in minutes (blank if unknown): ")?,
        ..LoginForm::default()
    };
    let credential: Credential = form
        .credential(Utc::now())
        .map_err(|message| anyhow::anyhow!(message))?;

    session.complete_login(credential)?;
    println!("\nLogin stored.");
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
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

        // Check for completed background tasks and session changes
        app.check_background_tasks().await;

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
