//! Login form state and flow.
//!
//! The view owns the form fields, the single error slot and the loading flag.
//! A front-end either awaits [`LoginView::submit`] or drives the two halves
//! itself (`begin_submit`, run the request elsewhere, `finish_submit`).

use tracing::{debug, info};

use crate::api::{ApiClient, AuthError};
use crate::auth::{AuthContext, Credentials, Session};
use crate::messages::{Locale, Message};
use crate::navigation::{Location, RedirectTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
    /// Already logged in; go here without showing the form.
    Redirect(Location),
    ShowForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Navigate(Location),
    Stay,
}

pub struct LoginView {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
    pub show_password: bool,
    error: Option<AuthError>,
    loading: bool,
    redirect: RedirectTarget,
}

impl LoginView {
    pub fn new(redirect: RedirectTarget) -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            remember_me: true,
            show_password: false,
            error: None,
            loading: false,
            redirect,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn mount(&self, ctx: &AuthContext) -> MountOutcome {
        if ctx.is_authenticated() {
            MountOutcome::Redirect(self.redirect.location())
        } else {
            MountOutcome::ShowForm
        }
    }

    pub fn redirect(&self) -> &RedirectTarget {
        &self.redirect
    }

    pub fn set_redirect(&mut self, redirect: RedirectTarget) {
        self.redirect = redirect;
    }

    pub fn error(&self) -> Option<AuthError> {
        self.error
    }

    pub fn error_message(&self, locale: Locale) -> Option<&'static str> {
        self.error.map(|e| e.user_message(locale))
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn submit_label(&self) -> Message {
        if self.loading {
            Message::LoggingIn
        } else {
            Message::LoginButton
        }
    }

    pub fn toggle_password_visibility(&mut self) {
        self.show_password = !self.show_password;
    }

    pub fn toggle_remember_me(&mut self) {
        self.remember_me = !self.remember_me;
    }

    /// Password as it should be shown: in clear or as asterisks.
    pub fn password_display(&self) -> String {
        if self.show_password {
            self.password.clone()
        } else {
            "*".repeat(self.password.chars().count())
        }
    }

    /// Validate and mark the form busy.
    ///
    /// Returns the credentials to send, or `None` if a request is already
    /// running or a field is empty (the error is set in that case).
    pub fn begin_submit(&mut self) -> Option<Credentials> {
        if self.loading {
            debug!("Login already in progress");
            return None;
        }

        self.error = None;
        let credentials = Credentials::new(self.email.clone(), self.password.clone());
        if !credentials.is_complete() {
            self.error = Some(AuthError::Validation);
            return None;
        }

        self.loading = true;
        Some(credentials)
    }

    /// Apply the login result. Always clears the loading flag.
    pub fn finish_submit(
        &mut self,
        result: Result<Session, AuthError>,
        ctx: &mut AuthContext,
    ) -> SubmitOutcome {
        self.loading = false;

        match result {
            Ok(session) => {
                ctx.login(session, self.remember_me);
                self.password.clear();
                info!(redirect = %self.redirect, "Login succeeded");
                SubmitOutcome::Navigate(self.redirect.location())
            }
            Err(e) => {
                self.error = Some(e);
                SubmitOutcome::Stay
            }
        }
    }

    pub async fn submit(&mut self, client: &ApiClient, ctx: &mut AuthContext) -> SubmitOutcome {
        let Some(credentials) = self.begin_submit() else {
            return SubmitOutcome::Stay;
        };
        let result = client.login(&credentials).await;
        self.finish_submit(result, ctx)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::auth::{MemoryStorage, SessionScope, SessionStore, User};
    use crate::navigation::Route;
    use crate::test_support::MockIdentity;

    fn context() -> AuthContext {
        AuthContext::initialize(SessionStore::new(MemoryStorage::new(), MemoryStorage::new()))
    }

    fn client_for(server: &MockIdentity) -> ApiClient {
        ApiClient::new(server.base_url.clone(), Duration::from_secs(5)).unwrap()
    }

    fn filled(redirect: Option<&str>) -> LoginView {
        let mut view = LoginView::new(RedirectTarget::parse(redirect)).with_email("a@b.com");
        view.password = "x".to_string();
        view
    }

    #[test]
    fn test_defaults() {
        let view = LoginView::new(RedirectTarget::root());
        assert!(view.remember_me);
        assert!(!view.show_password);
        assert!(!view.is_loading());
        assert_eq!(view.submit_label(), Message::LoginButton);
        assert_eq!(view.error(), None);
    }

    #[test]
    fn test_mount_shows_form_when_anonymous() {
        let view = LoginView::new(RedirectTarget::root());
        assert_eq!(view.mount(&context()), MountOutcome::ShowForm);
    }

    #[test]
    fn test_mount_redirects_when_authenticated() {
        let mut ctx = context();
        ctx.login(Session::new("T", User::new("a@b.com")), true);

        let view = LoginView::new(RedirectTarget::parse(Some("/mypage")));
        match view.mount(&ctx) {
            MountOutcome::Redirect(location) => assert_eq!(location.route, Route::MyPage),
            other => panic!("expected redirect, got {:?}", other),
        }

        let view = LoginView::new(RedirectTarget::root());
        assert_eq!(view.mount(&ctx), MountOutcome::Redirect(Location::new(Route::Home)));
    }

    #[test]
    fn test_begin_submit_validates() {
        let mut view = LoginView::new(RedirectTarget::root());
        assert!(view.begin_submit().is_none());
        assert_eq!(view.error(), Some(AuthError::Validation));
        assert!(!view.is_loading());

        view.email = "a@b.com".to_string();
        assert!(view.begin_submit().is_none());
        assert_eq!(
            view.error_message(Locale::Ko),
            Some("이메일과 비밀번호를 모두 입력해주세요")
        );
    }

    #[test]
    fn test_begin_submit_blocks_second_attempt() {
        let mut view = filled(None);
        assert!(view.begin_submit().is_some());
        assert!(view.is_loading());
        assert_eq!(view.submit_label(), Message::LoggingIn);
        assert!(view.begin_submit().is_none());
    }

    #[test]
    fn test_finish_submit_failure_reenables() {
        let mut ctx = context();
        let mut view = filled(None);
        view.begin_submit().unwrap();

        let outcome = view.finish_submit(Err(AuthError::InvalidCredentials), &mut ctx);
        assert_eq!(outcome, SubmitOutcome::Stay);
        assert!(!view.is_loading());
        assert_eq!(view.password, "x");
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn test_password_display() {
        let mut view = filled(None);
        view.password = "hunter2".to_string();
        assert_eq!(view.password_display(), "*******");
        view.toggle_password_visibility();
        assert_eq!(view.password_display(), "hunter2");
    }

    #[tokio::test]
    async fn test_submit_success_default_redirect() {
        let server = MockIdentity::start(200, r#"{"token":"T"}"#).await;
        let mut ctx = context();
        let mut view = filled(None);

        let outcome = view.submit(&client_for(&server), &mut ctx).await;

        assert_eq!(outcome, SubmitOutcome::Navigate(Location::new(Route::Home)));
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.store().load().unwrap().user.email, "a@b.com");
        assert!(view.password.is_empty());
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn test_submit_success_uses_redirect() {
        let server = MockIdentity::start(200, r#"{"token":"T"}"#).await;
        let mut ctx = context();
        let mut view = filled(Some("/mypage"));

        match view.submit(&client_for(&server), &mut ctx).await {
            SubmitOutcome::Navigate(location) => assert_eq!(location.route, Route::MyPage),
            SubmitOutcome::Stay => panic!("expected navigation"),
        }
    }

    #[tokio::test]
    async fn test_submit_rejected_stays_with_fixed_message() {
        let server = MockIdentity::start(401, r#"{"message":"bad password"}"#).await;
        let mut ctx = context();
        let mut view = filled(None);

        let outcome = view.submit(&client_for(&server), &mut ctx).await;

        assert_eq!(outcome, SubmitOutcome::Stay);
        assert_eq!(view.error(), Some(AuthError::InvalidCredentials));
        assert_eq!(
            view.error_message(Locale::Ko),
            Some("이메일 또는 비밀번호가 올바르지 않습니다")
        );
        assert!(!view.is_loading());
        assert!(!ctx.is_authenticated());
    }

    #[tokio::test]
    async fn test_submit_empty_field_sends_nothing() {
        let server = MockIdentity::start(200, r#"{"token":"T"}"#).await;
        let mut ctx = context();
        let mut view = LoginView::new(RedirectTarget::root()).with_email("a@b.com");

        let outcome = view.submit(&client_for(&server), &mut ctx).await;

        assert_eq!(outcome, SubmitOutcome::Stay);
        assert_eq!(view.error(), Some(AuthError::Validation));
        assert_eq!(server.hits(), 0);
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn test_remember_me_off_keeps_session_ephemeral() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockIdentity::start(200, r#"{"token":"T"}"#).await;
        let mut ctx = AuthContext::initialize(SessionStore::on_disk(dir.path()));
        let mut view = filled(None);
        view.toggle_remember_me();

        view.submit(&client_for(&server), &mut ctx).await;

        let (_, scope) = ctx.store().load_with_scope().unwrap();
        assert_eq!(scope, SessionScope::Ephemeral);
        assert!(SessionStore::on_disk(dir.path()).load().is_none());
    }

    #[tokio::test]
    async fn test_remember_me_on_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockIdentity::start(200, r#"{"token":"T"}"#).await;
        let mut ctx = AuthContext::initialize(SessionStore::on_disk(dir.path()));
        let mut view = filled(None);

        view.submit(&client_for(&server), &mut ctx).await;

        let restarted = AuthContext::initialize(SessionStore::on_disk(dir.path()));
        assert_eq!(restarted.user().unwrap().email, "a@b.com");
    }

    #[tokio::test]
    async fn test_error_cleared_on_next_attempt() {
        let server = MockIdentity::start(200, r#"{"token":"T"}"#).await;
        let mut ctx = context();
        let mut view = LoginView::new(RedirectTarget::root());

        view.submit(&client_for(&server), &mut ctx).await;
        assert_eq!(view.error(), Some(AuthError::Validation));

        view.email = "a@b.com".to_string();
        view.password = "x".to_string();
        view.submit(&client_for(&server), &mut ctx).await;
        assert_eq!(view.error(), None);
    }
}
