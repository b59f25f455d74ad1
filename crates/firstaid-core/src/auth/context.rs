//! Process-lifetime authentication state.
//!
//! `AuthContext` is created once from a `SessionStore` and handed to every
//! view that needs it. It is only mutated by `login`, `logout` and
//! `expire_stale`, and all of them write through to the store. When the store
//! has a max age, a session past it reads as anonymous here at the same moment
//! the store stops loading it.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::session::{Session, SessionScope, SessionStore, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated(User),
}

/// Bookkeeping for the signed-in session, kept alongside the user.
#[derive(Debug, Clone, Copy)]
struct Active {
    issued_at: DateTime<Utc>,
    scope: SessionScope,
}

pub struct AuthContext {
    store: SessionStore,
    state: AuthState,
    active: Option<Active>,
}

impl AuthContext {
    /// Start in whatever state the store currently holds.
    pub fn initialize(store: SessionStore) -> Self {
        let (state, active) = match store.load_with_scope() {
            Some((session, scope)) => {
                info!(email = %session.user.email, ?scope, "Restored session");
                let active = Active {
                    issued_at: session.issued_at,
                    scope,
                };
                (AuthState::Authenticated(session.user), Some(active))
            }
            None => (AuthState::Anonymous, None),
        };
        Self {
            store,
            state,
            active,
        }
    }

    pub fn login(&mut self, session: Session, persistent: bool) {
        let mut scope = SessionScope::from_remember_me(persistent);

        if let Err(e) = self.store.save(&session, persistent) {
            warn!(error = %e, ?scope, "Failed to save session");
            if persistent {
                // Keep the user logged in for this process at least.
                scope = SessionScope::Ephemeral;
                if let Err(e) = self.store.save(&session, false) {
                    warn!(error = %e, "Failed to clear previous session after fallback");
                }
            }
        }

        info!(email = %session.user.email, ?scope, "Logged in");
        self.active = Some(Active {
            issued_at: session.issued_at,
            scope,
        });
        self.state = AuthState::Authenticated(session.user);
    }

    pub fn logout(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session");
        }
        if let AuthState::Authenticated(ref user) = self.state {
            info!(email = %user.email, "Logged out");
        }
        self.state = AuthState::Anonymous;
        self.active = None;
    }

    /// Drop to anonymous once the session passes the store's max age.
    /// Returns true if that happened on this call.
    pub fn expire_stale(&mut self) -> bool {
        if !matches!(self.state, AuthState::Authenticated(_)) || !self.is_expired() {
            return false;
        }
        info!("Session expired");
        self.logout();
        true
    }

    fn is_expired(&self) -> bool {
        match (self.active, self.store.max_age()) {
            (Some(active), Some(max_age)) => Utc::now() - active.issued_at > max_age,
            _ => false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn user(&self) -> Option<&User> {
        match self.state {
            AuthState::Authenticated(ref user) if !self.is_expired() => Some(user),
            _ => None,
        }
    }

    pub fn state(&self) -> AuthState {
        match self.user() {
            Some(user) => AuthState::Authenticated(user.clone()),
            None => AuthState::Anonymous,
        }
    }

    /// Scope the current session was saved in, without touching storage.
    pub fn scope(&self) -> Option<SessionScope> {
        if self.is_authenticated() {
            self.active.map(|active| active.scope)
        } else {
            None
        }
    }

    /// Bearer token for privileged calls, read from the store.
    pub fn token(&self) -> Option<String> {
        if !self.is_authenticated() {
            return None;
        }
        self.store.load().map(|session| session.token)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}
