//! Application state management for the FirstAidKeyring terminal client.
//!
//! This module contains the `App` struct that owns the auth context, the
//! current location, the login and header view models, and the channel that
//! carries login results back from the background request task.

use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use firstaid_core::api::{ApiClient, AuthError};
use firstaid_core::auth::{AuthContext, Session, SessionStore};
use firstaid_core::config::{Config, ENV_EMAIL, ENV_PASSWORD};
use firstaid_core::messages::{Locale, Message};
use firstaid_core::navigation::{self, Location, Route};
use firstaid_core::views::{HeaderAction, HeaderView, LoginView, MenuItem, SubmitOutcome};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the login result channel.
/// Only one login runs at a time; a little headroom is plenty.
const CHANNEL_BUFFER_SIZE: usize = 4;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    ShowPassword,
    RememberMe,
    Button,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::ShowPassword,
            LoginFocus::ShowPassword => LoginFocus::RememberMe,
            LoginFocus::RememberMe => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Email,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Email,
            LoginFocus::ShowPassword => LoginFocus::Password,
            LoginFocus::RememberMe => LoginFocus::ShowPassword,
            LoginFocus::Button => LoginFocus::RememberMe,
        }
    }
}

type LoginResult = Result<Session, AuthError>;

/// A finished login request, tagged with the attempt that started it.
type LoginReply = (u64, LoginResult);

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub auth: AuthContext,
    pub api: ApiClient,
    config_path: Option<PathBuf>,

    // UI State
    pub state: AppState,
    pub location: Location,
    pub header: HeaderView,
    pub status_message: Option<String>,

    // Login form state
    pub login: LoginView,
    pub login_focus: LoginFocus,

    // Background login request
    login_attempt: u64,
    login_tx: mpsc::Sender<LoginReply>,
    login_rx: mpsc::Receiver<LoginReply>,
}

impl App {
    /// Create the application from config, restoring any stored session.
    pub fn new(config: Config, start: Location) -> Result<Self> {
        let session_dir = config.session_dir()?;
        debug!(?session_dir, "Session directory configured");

        let store = SessionStore::on_disk(session_dir).with_max_age(config.session_max_age());
        let auth = AuthContext::initialize(store);
        let api = ApiClient::from_config(&config)?;

        let config_path = match Config::config_path() {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "No config path; last email will not be remembered");
                None
            }
        };

        let mut app = Self::with_parts(config, auth, api, start);
        app.config_path = config_path;
        Ok(app)
    }

    pub fn with_parts(config: Config, auth: AuthContext, api: ApiClient, start: Location) -> Self {
        let (login_tx, login_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let mut app = Self {
            config,
            auth,
            api,
            config_path: None,

            state: AppState::Normal,
            location: Location::new(Route::Home),
            header: HeaderView::new(),
            status_message: None,

            login: LoginView::new(Default::default()),
            login_focus: LoginFocus::Email,

            login_attempt: 0,
            login_tx,
            login_rx,
        };
        app.navigate(start);
        app
    }

    pub fn locale(&self) -> Locale {
        self.config.locale
    }

    pub fn text(&self, message: Message) -> &'static str {
        message.text(self.config.locale)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Go to a location, applying the auth route guard.
    pub fn navigate(&mut self, location: Location) {
        let location = navigation::guard(location, self.auth.is_authenticated());
        debug!(location = %location, "Navigating");

        if location.route == Route::Login {
            self.open_login(&location);
        }

        self.header.close_menu();
        self.location = location;
    }

    pub fn go(&mut self, route: Route) {
        self.navigate(Location::new(route));
    }

    /// Start a fresh login form for this visit, prefilled from env or config.
    ///
    /// A form with a request in flight is kept as it is, apart from the
    /// redirect, so the request's result still lands on the form that sent it.
    fn open_login(&mut self, location: &Location) {
        if self.login.is_loading() {
            debug!("Login in progress, keeping the current form");
            self.login.set_redirect(location.redirect.clone());
            return;
        }

        let email = std::env::var(ENV_EMAIL)
            .ok()
            .or_else(|| self.config.last_email.clone())
            .unwrap_or_default();

        self.login = LoginView::new(location.redirect.clone()).with_email(email);
        if let Ok(password) = std::env::var(ENV_PASSWORD) {
            self.login.password = password;
        }

        self.login_focus = if self.login.email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
    }

    /// Registration link from the login page, keeping the redirect.
    pub fn go_register(&mut self) {
        let link = self.login.redirect().register_link();
        self.navigate(Location::parse(&link));
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    /// Validate the form and start the login request in the background.
    pub fn submit_login(&mut self) {
        let Some(credentials) = self.login.begin_submit() else {
            return;
        };

        self.login_attempt += 1;
        let attempt = self.login_attempt;
        let api = self.api.clone();
        let tx = self.login_tx.clone();

        tokio::spawn(async move {
            let result = api.login(&credentials).await;
            if tx.send((attempt, result)).await.is_err() {
                warn!("Login finished after the app shut down");
            }
        });
    }

    /// Check for a completed login request and apply it, and drop a session
    /// that has outlived its max age.
    pub fn check_background_tasks(&mut self) {
        while let Ok((attempt, result)) = self.login_rx.try_recv() {
            if attempt != self.login_attempt || !self.login.is_loading() {
                warn!(attempt, current = self.login_attempt, "Ignoring stale login result");
                continue;
            }
            self.apply_login_result(result);
        }

        if self.auth.expire_stale() {
            self.status_message = Some(self.text(Message::NotLoggedIn).to_string());
            let current = self.location.clone();
            self.navigate(current);
        }
    }

    fn apply_login_result(&mut self, result: LoginResult) {
        let email = result.as_ref().ok().map(|session| session.user.email.clone());

        match self.login.finish_submit(result, &mut self.auth) {
            SubmitOutcome::Navigate(location) => {
                if let Some(email) = email {
                    self.remember_email(email);
                }
                self.status_message = None;
                if self.location.route == Route::Login {
                    self.navigate(location);
                } else {
                    // The user left the form while waiting; stay where they are.
                    self.header.close_menu();
                }
            }
            SubmitOutcome::Stay => {
                debug!("Login failed, staying on form");
            }
        }
    }

    fn remember_email(&mut self, email: String) {
        if let Some(ref path) = self.config_path {
            if let Err(e) = Config::store_last_email(path, &email) {
                warn!(error = %e, "Failed to save config");
            }
        }
        self.config.last_email = Some(email);
    }

    // =========================================================================
    // Header
    // =========================================================================

    pub fn toggle_menu(&mut self) {
        if self.auth.is_authenticated() {
            self.header.toggle_menu();
        }
    }

    pub fn activate_menu_item(&mut self) {
        let item = self.header.selected();
        self.run_menu_item(item);
    }

    fn run_menu_item(&mut self, item: MenuItem) {
        match self.header.activate(item, &mut self.auth) {
            HeaderAction::Navigate(location) => self.navigate(location),
            HeaderAction::LoggedOut => {
                info!("User logged out");
                self.status_message = Some(self.text(Message::NotLoggedIn).to_string());
                // Re-check the current page now that the session is gone.
                let current = self.location.clone();
                self.navigate(current);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
