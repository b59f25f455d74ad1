//! Authentication module for managing the local session and auth state.
//!
//! This module provides:
//! - `Credentials`: transient email/password pair, never persisted
//! - `SessionStore`: token + user persistence in two scopes
//!   (on-disk for "remember me", in-process otherwise)
//! - `AuthContext`: the Anonymous/Authenticated state machine that writes
//!   through to the store

pub mod context;
pub mod credentials;
pub mod session;
pub mod storage;

pub use context::{AuthContext, AuthState};
pub use credentials::Credentials;
pub use session::{Session, SessionScope, SessionStore, User};
pub use storage::{FileStorage, MemoryStorage, Storage};
