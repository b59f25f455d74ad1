//! REST client module for the FirstAidKeyring identity service.
//!
//! This module provides the `ApiClient`, which issues the login request and
//! normalizes every outcome into a `Session` or an `AuthError`.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::{ApiError, AuthError};
