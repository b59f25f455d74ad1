//! API client for the FirstAidKeyring identity service.

use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::{Credentials, Session, User};
use crate::config::Config;

use super::{ApiError, AuthError};

/// Login endpoint, relative to the configured base URL
const LOGIN_PATH: &str = "users/login";

/// Success body of `POST /users/login`. Fields beyond these are ignored.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Client for the identity service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.api_base_url.clone(), config.request_timeout())
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Log in with the given credentials.
    ///
    /// Empty fields fail with [`AuthError::Validation`] without a request.
    /// Every remote failure, whatever its cause, is
    /// [`AuthError::InvalidCredentials`]; the cause is only logged.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        if !credentials.is_complete() {
            debug!("Login rejected locally: missing field");
            return Err(AuthError::Validation);
        }

        match self.post_login(credentials).await {
            Ok(response) => Self::session_from(credentials, response),
            Err(e) => {
                warn!(error = %e, "Login request failed");
                Err(e.into())
            }
        }
    }

    fn session_from(credentials: &Credentials, response: LoginResponse) -> Result<Session, AuthError> {
        let token = match response.token {
            Some(token) if !token.trim().is_empty() => token,
            _ => {
                warn!("Login response carried no token");
                return Err(AuthError::InvalidCredentials);
            }
        };

        // The submitted email is the identity; a server-sent name is kept for display.
        let user = User {
            email: credentials.email.clone(),
            name: response.name.filter(|n| !n.trim().is_empty()),
        };
        Ok(Session::new(token, user))
    }

    async fn post_login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint(LOGIN_PATH);
        debug!(url = %url, email = %credentials.email, "Sending login request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(credentials)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let body = response.bytes().await?;

        serde_json::from_slice(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse login response: {}", e)))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}
