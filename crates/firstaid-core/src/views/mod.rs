//! Headless view models for the login page and the site header.
//!
//! Both read and mutate an [`AuthContext`](crate::auth::AuthContext) passed in
//! by the caller; neither holds a reference to it.

pub mod header;
pub mod login;

pub use header::{HeaderAction, HeaderModel, HeaderView, MenuItem, ANONYMOUS_ACTIONS};
pub use login::{LoginView, MountOutcome, SubmitOutcome};

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::api::ApiClient;
    use crate::auth::{AuthContext, MemoryStorage, SessionStore};
    use crate::navigation::{Location, RedirectTarget, Route};
    use crate::test_support::MockIdentity;

    #[tokio::test]
    async fn test_login_then_header_shows_identity() {
        let server = MockIdentity::start(200, r#"{"token":"T"}"#).await;
        let client = ApiClient::new(server.base_url.clone(), Duration::from_secs(5)).unwrap();
        let mut ctx =
            AuthContext::initialize(SessionStore::new(MemoryStorage::new(), MemoryStorage::new()));
        let header = HeaderView::new();
        assert_eq!(header.model(&ctx), HeaderModel::Anonymous);

        let mut login = LoginView::new(RedirectTarget::root()).with_email("a@b.com");
        login.password = "x".to_string();
        let outcome = login.submit(&client, &mut ctx).await;

        assert_eq!(outcome, SubmitOutcome::Navigate(Location::new(Route::Home)));
        assert!(matches!(
            header.model(&ctx),
            HeaderModel::Authenticated { identity: "a@b.com", .. }
        ));
    }

    #[tokio::test]
    async fn test_logout_then_login_view_shows_form() {
        let server = MockIdentity::start(200, r#"{"token":"T"}"#).await;
        let client = ApiClient::new(server.base_url.clone(), Duration::from_secs(5)).unwrap();
        let mut ctx =
            AuthContext::initialize(SessionStore::new(MemoryStorage::new(), MemoryStorage::new()));

        let mut login = LoginView::new(RedirectTarget::root()).with_email("a@b.com");
        login.password = "x".to_string();
        login.submit(&client, &mut ctx).await;
        assert!(matches!(login.mount(&ctx), MountOutcome::Redirect(_)));

        let mut header = HeaderView::new();
        header.activate(MenuItem::Logout, &mut ctx);
        assert_eq!(login.mount(&ctx), MountOutcome::ShowForm);
    }
}
