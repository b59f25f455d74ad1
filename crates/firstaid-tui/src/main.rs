//! FirstAidKeyring terminal client.
//!
//! Starts a keyboard-driven interface for logging in and reaching the
//! account pages, or runs a single `login` / `logout` / `status` command.

mod app;
mod ui;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use firstaid_core::api::ApiClient;
use firstaid_core::auth::{AuthContext, SessionScope, SessionStore};
use firstaid_core::config::Config;
use firstaid_core::messages::Message;
use firstaid_core::navigation::{Location, RedirectTarget};
use firstaid_core::views::{LoginView, SubmitOutcome};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name prefix inside the logs directory
const LOG_FILE_PREFIX: &str = "firstaid.log";

#[derive(Parser, Debug)]
#[command(name = "firstaid", version, about = "FirstAidKeyring terminal client")]
struct Cli {
    /// Page to open, e.g. `/mypage` or `/login?redirect=/patient-info`
    #[arg(long, default_value = "/")]
    route: String,

    /// Where to go after logging in (local paths only)
    #[arg(long)]
    redirect: Option<String>,

    /// Override the identity service base URL
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: Option<String>,

        /// Keep the session only for this process
        #[arg(long)]
        no_remember: bool,
    },
    /// Clear the stored session
    Logout,
    /// Show who is logged in
    Status,
}

/// Log to stderr, for one-shot commands.
fn init_stderr_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Log to a daily file in the data directory; the terminal belongs to the UI.
fn init_file_tracing(config: &Config) -> Result<WorkerGuard> {
    let log_dir = config.data_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(guard)
}

fn load_config(cli: &Cli) -> Config {
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    if let Some(ref url) = cli.api_url {
        config.api_base_url = url.clone();
    }
    config
}

fn start_location(cli: &Cli) -> Location {
    let mut location = Location::parse(&cli.route);
    if cli.redirect.is_some() {
        location.redirect = RedirectTarget::parse(cli.redirect.as_deref());
    }
    location
}

fn open_auth(config: &Config) -> Result<AuthContext> {
    let store = SessionStore::on_disk(config.session_dir()?).with_max_age(config.session_max_age());
    Ok(AuthContext::initialize(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Some(ref command) = cli.command {
        init_stderr_tracing();
        let config = load_config(&cli);
        return match command {
            Command::Login { email, no_remember } => {
                login_command(config, email.clone(), !no_remember).await
            }
            Command::Logout => logout_command(&config),
            Command::Status => status_command(&config),
        };
    }

    let config = load_config(&cli);
    let _log_guard = match init_file_tracing(&config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {:#}", e);
            None
        }
    };
    info!("FirstAidKeyring TUI starting");

    // Create app before touching the terminal so setup errors print normally
    let mut app = App::new(config, start_location(&cli))?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

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

    info!("FirstAidKeyring TUI shutting down");
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout so login results show up promptly
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Check for a finished login request
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

fn prompt_email(label: &str) -> Result<String> {
    eprint!("{}: ", label);
    io::stderr().flush()?;
    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    Ok(email.trim().to_string())
}

async fn login_command(config: Config, email: Option<String>, remember_me: bool) -> Result<()> {
    let locale = config.locale;
    let mut auth = open_auth(&config)?;
    let api = ApiClient::from_config(&config)?;

    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt_email(Message::Email.text(locale))?,
    };
    let password = match std::env::var(firstaid_core::config::ENV_PASSWORD) {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password(format!("{}: ", Message::Password.text(locale)))
            .context("Failed to read password")?,
    };

    let mut view = LoginView::new(RedirectTarget::root()).with_email(email.clone());
    view.password = password;
    view.remember_me = remember_me;

    match view.submit(&api, &mut auth).await {
        SubmitOutcome::Navigate(_) => {
            let saved = Config::config_path().and_then(|path| Config::store_last_email(&path, &email));
            if let Err(e) = saved {
                warn!(error = %e, "Failed to save config");
            }
            let name = auth.user().map(|u| u.display_name().to_string()).unwrap_or_default();
            println!("{}", name);
            Ok(())
        }
        SubmitOutcome::Stay => match view.error_message(locale) {
            Some(message) => bail!("{}", message),
            None => bail!("{}", Message::InvalidCredentials.text(locale)),
        },
    }
}

fn logout_command(config: &Config) -> Result<()> {
    let mut auth = open_auth(config)?;
    auth.logout();
    println!("{}", Message::NotLoggedIn.text(config.locale));
    Ok(())
}

fn status_command(config: &Config) -> Result<()> {
    let auth = open_auth(config)?;
    match auth.store().load_with_scope() {
        Some((session, scope)) => {
            let scope = match scope {
                SessionScope::Persistent => "persistent",
                SessionScope::Ephemeral => "this session only",
            };
            println!("{} ({})", session.user.display_name(), scope);
        }
        None => println!("{}", Message::NotLoggedIn.text(config.locale)),
    }
    Ok(())
}
