use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use firstaid_core::auth::credentials::{can_add_email_char, can_add_password_char};
use firstaid_core::navigation::Route;

use crate::app::{App, AppState, LoginFocus};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Any key clears a stale status message
    app.status_message = None;

    // The login form takes all printable keys
    if app.location.route == Route::Login {
        return handle_login_input(app, key);
    }

    if app.header.is_menu_open() {
        return handle_menu_input(app, key);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('m') => app.toggle_menu(),
        KeyCode::Char('s') => app.go(Route::Settings),
        KeyCode::Char('h') | KeyCode::Esc => app.go(Route::Home),
        KeyCode::Char('l') if !app.is_authenticated() => app.go(Route::Login),
        KeyCode::Char('r') if !app.is_authenticated() => app.go(Route::Register),
        KeyCode::Char('p') => app.go(Route::MyPage),
        KeyCode::Char('i') => app.go(Route::PatientInfo),
        _ => {}
    }
    Ok(false)
}

fn handle_menu_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('m') => app.header.close_menu(),
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => app.header.select_next(),
        KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => app.header.select_prev(),
        KeyCode::Enter => app.activate_menu_item(),
        KeyCode::Char('q') => {
            app.header.close_menu();
            app.state = AppState::ConfirmingQuit;
        }
        _ => {}
    }
    Ok(false)
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('p') => app.login.toggle_password_visibility(),
            KeyCode::Char('r') => app.go_register(),
            KeyCode::Char('f') => app.go(Route::ForgotPassword),
            _ => {}
        }
        return Ok(false);
    }

    match key.code {
        KeyCode::Esc => {
            app.go(Route::Home);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = app.login_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = app.login_focus.prev();
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => app.submit_login(),
            LoginFocus::ShowPassword => app.login.toggle_password_visibility(),
            LoginFocus::RememberMe => app.login.toggle_remember_me(),
        },
        KeyCode::Char(' ') if app.login_focus == LoginFocus::ShowPassword => {
            app.login.toggle_password_visibility();
        }
        KeyCode::Char(' ') if app.login_focus == LoginFocus::RememberMe => {
            app.login.toggle_remember_me();
        }
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login.email.pop();
            }
            LoginFocus::Password => {
                app.login.password.pop();
            }
            _ => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_email_char(app.login.email.chars().count(), c) {
                    app.login.email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login.password.chars().count(), c) {
                    app.login.password.push(c);
                }
            }
            // Ignore character input on buttons and checkboxes
            _ => {}
        },
        _ => {}
    }
    Ok(false)
}
