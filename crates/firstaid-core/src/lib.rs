//! FirstAidKeyring client core.
//!
//! - `api`: identity service client and error types
//! - `auth`: session store and auth context
//! - `navigation`: routes, redirect handling, route guard
//! - `views`: login and header view models
//! - `config`, `messages`: configuration and fixed user-facing strings

pub mod api;
pub mod auth;
pub mod config;
pub mod messages;
pub mod navigation;
pub mod views;

#[cfg(test)]
mod test_support;

pub use api::{ApiClient, ApiError, AuthError};
pub use auth::{AuthContext, AuthState, Credentials, Session, SessionScope, SessionStore, User};
pub use config::Config;
pub use messages::{Locale, Message};
pub use navigation::{Location, RedirectTarget, Route};
