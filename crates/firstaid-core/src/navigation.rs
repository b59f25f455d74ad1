//! Routes, the `redirect` query parameter, and the auth route guard.
//!
//! Locations are plain app-local paths such as `/login?redirect=%2Fmypage`.
//! Redirect targets are restricted to local absolute paths; anything else
//! resolves to the site root.

use std::fmt;

use reqwest::Url;
use tracing::debug;

/// Synthetic origin used to parse app-local paths with `Url`.
const APP_ORIGIN: &str = "app://firstaid/";

const REDIRECT_PARAM: &str = "redirect";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    ForgotPassword,
    MyPage,
    PatientInfo,
    Settings,
    Other(String),
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Home,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/forgot-password" => Route::ForgotPassword,
            "/mypage" => Route::MyPage,
            "/patient-info" => Route::PatientInfo,
            "/settings" => Route::Settings,
            other => Route::Other(other.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::ForgotPassword => "/forgot-password",
            Route::MyPage => "/mypage",
            Route::PatientInfo => "/patient-info",
            Route::Settings => "/settings",
            Route::Other(path) => path,
        }
    }

    /// Pages that only make sense for a logged-in user.
    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::MyPage | Route::PatientInfo)
    }
}

fn app_origin() -> Url {
    // APP_ORIGIN is a constant and always parses.
    Url::parse(APP_ORIGIN).unwrap_or_else(|_| unreachable!("invalid APP_ORIGIN"))
}

/// Parse an app-local location. Returns `None` for external URLs.
fn parse_local(location: &str) -> Option<Url> {
    if !is_local_path(location) {
        return None;
    }
    let origin = app_origin();
    let url = origin.join(location).ok()?;
    (url.scheme() == origin.scheme() && url.host_str() == origin.host_str()).then_some(url)
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.chars().any(char::is_control)
}

/// Where to go after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget(String);

impl RedirectTarget {
    pub fn root() -> Self {
        RedirectTarget("/".to_string())
    }

    /// Validate a raw `redirect` value. Missing, empty, or non-local values
    /// give the root.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).filter(|r| !r.is_empty()) {
            Some(raw) if parse_local(raw).is_some() => RedirectTarget(raw.to_string()),
            Some(raw) => {
                debug!(redirect = %raw, "Ignoring non-local redirect");
                Self::root()
            }
            None => Self::root(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// The login page shows a "login required" notice when sent from elsewhere.
    pub fn show_banner(&self) -> bool {
        !self.is_root()
    }

    pub fn location(&self) -> Location {
        Location::parse(&self.0)
    }

    /// Registration link, carrying the redirect when it is not the root.
    pub fn register_link(&self) -> String {
        self.link_for(Route::Register)
    }

    fn link_for(&self, route: Route) -> String {
        if self.is_root() {
            return route.path().to_string();
        }
        let mut url = app_origin();
        url.set_path(route.path());
        url.query_pairs_mut().append_pair(REDIRECT_PARAM, &self.0);
        match url.query() {
            Some(query) => format!("{}?{}", route.path(), query),
            None => route.path().to_string(),
        }
    }
}

impl Default for RedirectTarget {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parsed location: the route plus its `redirect` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub route: Route,
    pub redirect: RedirectTarget,
}

impl Location {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            redirect: RedirectTarget::root(),
        }
    }

    pub fn login(redirect: RedirectTarget) -> Self {
        Self {
            route: Route::Login,
            redirect,
        }
    }

    /// Parse `path[?query]`. Non-local input parses as home.
    pub fn parse(location: &str) -> Self {
        let Some(url) = parse_local(location.trim()) else {
            return Self::new(Route::Home);
        };
        let redirect = url
            .query_pairs()
            .find(|(key, _)| key == REDIRECT_PARAM)
            .map(|(_, value)| value.into_owned());

        Self {
            route: Route::from_path(url.path()),
            redirect: RedirectTarget::parse(redirect.as_deref()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.route == Route::Login || self.route == Route::Register {
            f.write_str(&self.redirect.link_for(self.route.clone()))
        } else {
            f.write_str(self.route.path())
        }
    }
}

/// Apply the auth route guard.
///
/// - Anonymous visits to protected routes go to login, remembering the route.
/// - Authenticated visits to login go straight to the redirect target.
pub fn guard(location: Location, authenticated: bool) -> Location {
    if authenticated && location.route == Route::Login {
        let target = location.redirect.location();
        debug!(target = %target, "Already authenticated, skipping login");
        if target.route == Route::Login {
            return Location::new(Route::Home);
        }
        return target;
    }

    if !authenticated && location.route.requires_auth() {
        let redirect = RedirectTarget::parse(Some(location.route.path()));
        debug!(route = %location.route.path(), "Login required");
        return Location::login(redirect);
    }

    location
}
