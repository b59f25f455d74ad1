use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use firstaid_core::auth::SessionScope;
use firstaid_core::messages::Message;
use firstaid_core::navigation::Route;
use firstaid_core::views::{HeaderModel, MenuItem, ANONYMOUS_ACTIONS};

use crate::app::{App, AppState, LoginFocus};

use super::styles;

/// Visible width of the login text fields
const FIELD_WIDTH: usize = 28;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Page content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_page(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    if app.header.is_menu_open() {
        render_menu_dropdown(frame, app, chunks[0]);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame, app);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    let left = Line::from(vec![
        Span::styled(" [s] ", styles::help_key_style()),
        Span::styled(app.text(Message::Settings), styles::muted_style()),
        Span::raw("   "),
        Span::styled(app.text(Message::AppTitle), styles::title_style()),
    ]);
    frame.render_widget(Paragraph::new(left), halves[0]);

    let right = match app.header.model(&app.auth) {
        HeaderModel::Authenticated {
            identity,
            menu_open,
            ..
        } => Line::from(vec![
            Span::styled(format!("● {} ", identity), styles::identity_style()),
            Span::styled(if menu_open { "▴" } else { "▾" }, styles::identity_style()),
            Span::styled(" [m] ", styles::help_key_style()),
        ]),
        HeaderModel::Anonymous => {
            let mut spans = Vec::new();
            for ((message, _), key) in ANONYMOUS_ACTIONS.iter().zip(["[l]", "[r]"]) {
                spans.push(Span::styled(format!("{} ", key), styles::help_key_style()));
                spans.push(Span::styled(app.text(*message), styles::link_style()));
                spans.push(Span::raw("  "));
            }
            Line::from(spans)
        }
    };
    frame.render_widget(Paragraph::new(right).alignment(Alignment::Right), halves[1]);
}

fn render_menu_dropdown(frame: &mut Frame, app: &App, header: Rect) {
    let HeaderModel::Authenticated { selected, .. } = app.header.model(&app.auth) else {
        return;
    };

    let width = 26;
    let height = MenuItem::ALL.len() as u16 + 2;
    let area = Rect::new(
        header.x + header.width.saturating_sub(width + 1),
        header.y + header.height,
        width.min(header.width),
        height,
    )
    .intersection(frame.area());

    frame.render_widget(Clear, area);

    let lines: Vec<Line> = MenuItem::ALL
        .iter()
        .map(|item| {
            let base = if *item == MenuItem::Logout {
                styles::error_style()
            } else {
                styles::list_item_style()
            };
            let style = if *item == selected {
                base.patch(styles::selected_style())
            } else {
                base
            };
            let marker = if *item == selected { "▶ " } else { "  " };
            Line::from(Span::styled(
                format!("{}{}", marker, app.text(item.label())),
                style,
            ))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_page(frame: &mut Frame, app: &App, area: Rect) {
    match app.location.route {
        Route::Login => render_login(frame, app, area),
        Route::Home => render_home(frame, app, area),
        Route::Settings => render_settings(frame, app, area),
        Route::MyPage => render_placeholder(frame, app, area, app.text(Message::MyPage)),
        Route::PatientInfo => render_placeholder(frame, app, area, app.text(Message::MedicalInfo)),
        Route::Register => render_placeholder(frame, app, area, app.text(Message::Register)),
        Route::ForgotPassword => {
            render_placeholder(frame, app, area, app.text(Message::ForgotPassword))
        }
        Route::Other(ref path) => render_placeholder(frame, app, area, path),
    }
}

fn render_home(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(app.text(Message::AppTitle), styles::title_style())),
        Line::from(Span::styled(app.text(Message::Tagline), styles::muted_style())),
        Line::from(Span::styled("TAG HERE · NFC", styles::muted_style())),
        Line::from(""),
    ];

    match app.auth.user() {
        Some(user) => {
            lines.push(Line::from(Span::styled(
                user.display_name().to_string(),
                styles::identity_style(),
            )));
            lines.push(Line::from(vec![
                Span::styled("[p] ", styles::help_key_style()),
                Span::styled(app.text(Message::MyPage), styles::list_item_style()),
                Span::raw("   "),
                Span::styled("[i] ", styles::help_key_style()),
                Span::styled(app.text(Message::MedicalInfo), styles::list_item_style()),
            ]));
        }
        None => {
            lines.push(Line::from(Span::styled(
                app.text(Message::NotLoggedIn),
                styles::muted_style(),
            )));
            lines.push(Line::from(vec![
                Span::styled("[l] ", styles::help_key_style()),
                Span::styled(app.text(Message::LoginButton), styles::link_style()),
            ]));
        }
    }

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_settings(frame: &mut Frame, app: &App, area: Rect) {
    let scope = match app.auth.scope() {
        Some(SessionScope::Persistent) => "persistent",
        Some(SessionScope::Ephemeral) => "this session only",
        None => "-",
    };

    let rows = [
        ("API", app.config.api_base_url.clone()),
        ("Locale", app.config.locale.to_string()),
        ("Timeout", format!("{}s", app.config.request_timeout_secs)),
        ("Session", scope.to_string()),
    ];

    let mut lines = vec![Line::from("")];
    for (label, value) in rows {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<10}", label), styles::muted_style()),
            Span::styled(value, styles::list_item_style()),
        ]));
    }

    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", app.text(Message::Settings)),
            styles::title_style(),
        ))
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_placeholder(frame: &mut Frame, app: &App, area: Rect, title: &str) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(app.location.to_string(), styles::muted_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("[h] ", styles::help_key_style()),
            Span::styled(app.text(Message::BackToHome), styles::link_style()),
        ]),
    ];

    let block = Block::default()
        .title(Span::styled(format!(" {} ", title), styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

fn field_style(focused: bool) -> Style {
    if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    }
}

fn checkbox_line<'a>(checked: bool, label: &'a str, hint: &'a str, focused: bool) -> Line<'a> {
    let mark = if checked { "[x] " } else { "[ ] " };
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{}{}", mark, label), field_style(focused)),
        Span::styled(hint, styles::muted_style()),
    ])
}

fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let view = &app.login;
    let focus = app.login_focus;

    let mut lines = vec![
        Line::from(Span::styled(app.text(Message::LoginTitle), styles::title_style()))
            .alignment(Alignment::Center),
        Line::from(Span::styled(app.text(Message::LoginPrompt), styles::muted_style()))
            .alignment(Alignment::Center),
        Line::from(""),
    ];

    if let Some(error) = view.error_message(app.locale()) {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}: ", app.text(Message::ErrorTitle)), styles::error_style()),
            Span::styled(error, styles::error_style()),
        ]));
    }

    if view.redirect().show_banner() {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}: ", app.text(Message::NoticeTitle)), styles::info_style()),
            Span::styled(app.text(Message::LoginRequired), styles::info_style()),
        ]));
    }

    if lines.len() > 3 {
        lines.push(Line::from(""));
    }

    let email_focused = focus == LoginFocus::Email;
    let cursor = if email_focused { "▌" } else { "" };
    lines.push(Line::from(Span::styled(
        format!("  {}", app.text(Message::Email)),
        styles::muted_style(),
    )));
    lines.push(Line::from(vec![
        Span::styled("  [", styles::muted_style()),
        Span::styled(
            format!("{:<width$}{}", view.email, cursor, width = FIELD_WIDTH),
            field_style(email_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));

    let password_focused = focus == LoginFocus::Password;
    let cursor = if password_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::styled(format!("  {}", app.text(Message::Password)), styles::muted_style()),
        Span::raw("   "),
        Span::styled(
            format!("{} (Ctrl+F)", app.text(Message::ForgotPassword)),
            styles::link_style(),
        ),
    ]));
    lines.push(Line::from(vec![
        Span::styled("  [", styles::muted_style()),
        Span::styled(
            format!("{:<width$}{}", view.password_display(), cursor, width = FIELD_WIDTH),
            field_style(password_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));
    lines.push(Line::from(""));

    lines.push(checkbox_line(
        view.show_password,
        app.text(Message::ShowPassword),
        "  (Ctrl+P)",
        focus == LoginFocus::ShowPassword,
    ));
    lines.push(checkbox_line(
        view.remember_me,
        app.text(Message::RememberMe),
        "",
        focus == LoginFocus::RememberMe,
    ));
    lines.push(Line::from(""));

    let button_focused = focus == LoginFocus::Button;
    let label = app.text(view.submit_label());
    let button = if view.is_loading() {
        Span::styled(format!("   {}   ", label), styles::disabled_style())
    } else if button_focused {
        Span::styled(format!(" ▶ {} ◀ ", label), styles::selected_style())
    } else {
        Span::styled(format!("   {}   ", label), styles::list_item_style())
    };
    lines.push(
        Line::from(vec![Span::raw("["), button, Span::raw("]")]).alignment(Alignment::Center),
    );
    lines.push(Line::from(""));

    lines.push(
        Line::from(vec![
            Span::styled(format!("{} ", app.text(Message::NoAccount)), styles::muted_style()),
            Span::styled(app.text(Message::Register), styles::link_style()),
            Span::styled(" (Ctrl+R)", styles::muted_style()),
        ])
        .alignment(Alignment::Center),
    );
    lines.push(
        Line::from(vec![
            Span::styled("← ", styles::muted_style()),
            Span::styled(app.text(Message::BackToHome), styles::muted_style()),
            Span::styled(" (Esc)", styles::muted_style()),
        ])
        .alignment(Alignment::Center),
    );

    let height = lines.len() as u16 + 2;
    let area = centered_rect_fixed(56, height, area);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = if app.location.route == Route::Login {
        "Tab: next | Enter: submit | Esc: home"
    } else if app.header.is_menu_open() {
        "↑↓: select | Enter: open | Esc: close"
    } else {
        "[h]ome | [q]uit"
    };

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => format!(" {} ", app.location),
    };

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left = Paragraph::new(Span::styled(left_text, styles::muted_style()))
        .style(styles::status_bar_style());
    let right = Paragraph::new(Span::styled(format!(" {} ", shortcuts), styles::muted_style()))
        .alignment(Alignment::Right)
        .style(styles::status_bar_style());
    frame.render_widget(left, halves[0]);
    frame.render_widget(right, halves[1]);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(46, 7, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(app.text(Message::AppTitle), styles::title_style())),
        Line::from(""),
        Line::from(Span::styled(app.text(Message::QuitPrompt), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" / ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);

    frame.render_widget(paragraph, area);
}
