//! Site header: identity label and account menu, or login/register links.

use crate::auth::AuthContext;
use crate::messages::Message;
use crate::navigation::{Location, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Profile,
    MedicalInfo,
    Logout,
}

impl MenuItem {
    pub const ALL: [MenuItem; 3] = [MenuItem::Profile, MenuItem::MedicalInfo, MenuItem::Logout];

    pub fn label(self) -> Message {
        match self {
            MenuItem::Profile => Message::MyPage,
            MenuItem::MedicalInfo => Message::MedicalInfo,
            MenuItem::Logout => Message::Logout,
        }
    }
}

/// Affordances shown to anonymous visitors.
pub const ANONYMOUS_ACTIONS: [(Message, Route); 2] = [
    (Message::LoginButton, Route::Login),
    (Message::Register, Route::Register),
];

/// What the header should render for the current auth state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderModel<'a> {
    Anonymous,
    Authenticated {
        identity: &'a str,
        menu_open: bool,
        selected: MenuItem,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderAction {
    Navigate(Location),
    /// The session was cleared; the caller re-checks the current page.
    LoggedOut,
}

#[derive(Debug, Default)]
pub struct HeaderView {
    menu_open: bool,
    selection: usize,
}

impl HeaderView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model<'a>(&self, ctx: &'a AuthContext) -> HeaderModel<'a> {
        match ctx.user() {
            Some(user) => HeaderModel::Authenticated {
                identity: user.display_name(),
                menu_open: self.menu_open,
                selected: self.selected(),
            },
            None => HeaderModel::Anonymous,
        }
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
        self.selection = 0;
    }

    pub fn close_menu(&mut self) {
        self.menu_open = false;
    }

    pub fn selected(&self) -> MenuItem {
        MenuItem::ALL[self.selection.min(MenuItem::ALL.len() - 1)]
    }

    pub fn select_next(&mut self) {
        self.selection = (self.selection + 1) % MenuItem::ALL.len();
    }

    pub fn select_prev(&mut self) {
        self.selection = (self.selection + MenuItem::ALL.len() - 1) % MenuItem::ALL.len();
    }

    /// Run a menu item. Logout happens immediately, without confirmation.
    pub fn activate(&mut self, item: MenuItem, ctx: &mut AuthContext) -> HeaderAction {
        self.menu_open = false;
        match item {
            MenuItem::Profile => HeaderAction::Navigate(Location::new(Route::MyPage)),
            MenuItem::MedicalInfo => HeaderAction::Navigate(Location::new(Route::PatientInfo)),
            MenuItem::Logout => {
                ctx.logout();
                HeaderAction::LoggedOut
            }
        }
    }

    pub fn activate_selected(&mut self, ctx: &mut AuthContext) -> HeaderAction {
        self.activate(self.selected(), ctx)
    }
}
