//! Stored session: the bearer token plus the user record.
//!
//! A session lives in one of two scopes. The persistent scope is a directory
//! of key files that outlives the process ("remember me"); the ephemeral
//! scope is process memory. `SessionStore` keeps at most one of them filled.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::storage::{FileStorage, MemoryStorage, Storage};

/// Key holding the raw bearer token
const TOKEN_KEY: &str = "token";

/// Key holding the JSON user record
const USER_KEY: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    /// Name if the identity service supplied one, otherwise the email.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
            issued_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, max_age: Option<Duration>) -> bool {
        match max_age {
            Some(max_age) => Utc::now() - self.issued_at > max_age,
            None => false,
        }
    }
}

/// On-disk shape of the `user` key.
#[derive(Debug, Serialize, Deserialize)]
struct UserRecord {
    #[serde(flatten)]
    user: User,
    issued_at: DateTime<Utc>,
}

/// Where a session lives: on disk ("remember me") or only in this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionScope {
    Persistent,
    Ephemeral,
}

impl SessionScope {
    pub fn from_remember_me(remember_me: bool) -> Self {
        if remember_me {
            SessionScope::Persistent
        } else {
            SessionScope::Ephemeral
        }
    }
}

/// Owns the stored session. At most one scope holds a session after any
/// `save`; `load` prefers the ephemeral scope.
pub struct SessionStore {
    persistent: Box<dyn Storage>,
    ephemeral: Box<dyn Storage>,
    max_age: Option<Duration>,
}

impl SessionStore {
    pub fn new(persistent: impl Storage + 'static, ephemeral: impl Storage + 'static) -> Self {
        Self {
            persistent: Box::new(persistent),
            ephemeral: Box::new(ephemeral),
            max_age: None,
        }
    }

    /// Persistent scope in `dir`, ephemeral scope in process memory.
    pub fn on_disk(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileStorage::new(dir), MemoryStorage::new())
    }

    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Write the session into the scope chosen by `persistent` and remove it
    /// from the other scope.
    ///
    /// An ephemeral save removes the on-disk session first, retrying once, so
    /// a remembered session from an earlier login cannot outlive this one. The
    /// ephemeral session is written even when that removal fails; the error is
    /// still returned.
    pub fn save(&self, session: &Session, persistent: bool) -> Result<()> {
        let scope = SessionScope::from_remember_me(persistent);

        match scope {
            SessionScope::Persistent => {
                Self::write_to(self.persistent.as_ref(), session)
                    .context("Failed to save Persistent session")?;
                Self::remove_from(self.ephemeral.as_ref())?;
            }
            SessionScope::Ephemeral => {
                let removed = Self::remove_from(self.persistent.as_ref()).or_else(|e| {
                    warn!(error = %e, "Failed to remove remembered session, retrying");
                    Self::remove_from(self.persistent.as_ref())
                });
                Self::write_to(self.ephemeral.as_ref(), session)
                    .context("Failed to save Ephemeral session")?;
                removed.context("Failed to remove remembered session")?;
            }
        }

        debug!(?scope, email = %session.user.email, "Session saved");
        Ok(())
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    /// The current session, or `None` if absent, malformed or expired.
    pub fn load(&self) -> Option<Session> {
        self.load_with_scope().map(|(session, _)| session)
    }

    pub fn load_with_scope(&self) -> Option<(Session, SessionScope)> {
        [
            (self.ephemeral.as_ref(), SessionScope::Ephemeral),
            (self.persistent.as_ref(), SessionScope::Persistent),
        ]
        .into_iter()
        .find_map(|(storage, scope)| {
            self.load_from(storage, scope)
                .map(|session| (session, scope))
        })
    }

    /// Remove all session data from both scopes. Idempotent.
    pub fn clear(&self) -> Result<()> {
        let ephemeral = Self::remove_from(self.ephemeral.as_ref());
        let persistent = Self::remove_from(self.persistent.as_ref());
        ephemeral.and(persistent)
    }

    fn write_to(storage: &dyn Storage, session: &Session) -> Result<()> {
        let record = UserRecord {
            user: session.user.clone(),
            issued_at: session.issued_at,
        };
        // User first: a session only loads once the token lands.
        storage.set(USER_KEY, &serde_json::to_string(&record)?)?;
        storage.set(TOKEN_KEY, &session.token)?;
        Ok(())
    }

    fn remove_from(storage: &dyn Storage) -> Result<()> {
        let token = storage.remove(TOKEN_KEY);
        let user = storage.remove(USER_KEY);
        token.and(user)
    }

    fn load_from(&self, storage: &dyn Storage, scope: SessionScope) -> Option<Session> {
        let token = match storage.get(TOKEN_KEY) {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                warn!(?scope, error = %e, "Failed to read session token");
                return None;
            }
        };

        let session = match Self::parse(token, storage.get(USER_KEY)) {
            Ok(session) => session,
            Err(e) => {
                warn!(?scope, error = %e, "Discarding malformed session");
                self.discard(storage, scope);
                return None;
            }
        };

        if session.is_expired(self.max_age) {
            debug!(?scope, issued_at = %session.issued_at, "Discarding expired session");
            self.discard(storage, scope);
            return None;
        }

        Some(session)
    }

    fn parse(token: String, user: Result<Option<String>>) -> Result<Session> {
        let token = token.trim().to_string();
        if token.is_empty() {
            anyhow::bail!("empty token");
        }
        let user = user?.ok_or_else(|| anyhow::anyhow!("missing user record"))?;
        let record: UserRecord =
            serde_json::from_str(&user).context("Failed to parse user record")?;
        if record.user.email.is_empty() {
            anyhow::bail!("user record has no email");
        }

        Ok(Session {
            token,
            user: record.user,
            issued_at: record.issued_at,
        })
    }

    fn discard(&self, storage: &dyn Storage, scope: SessionScope) {
        if let Err(e) = Self::remove_from(storage) {
            warn!(?scope, error = %e, "Failed to remove stale session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(email: &str) -> Session {
        Session::new("T", User::new(email))
    }

    #[test]
    fn test_user_display_name() {
        let mut user = User::new("a@b.com");
        assert_eq!(user.display_name(), "a@b.com");
        user.name = Some("Kim".to_string());
        assert_eq!(user.display_name(), "Kim");
        user.name = Some("  ".to_string());
        assert_eq!(user.display_name(), "a@b.com");
    }

    #[test]
    fn test_session_expiry() {
        let mut s = session("a@b.com");
        assert!(!s.is_expired(None));
        assert!(!s.is_expired(Some(Duration::days(1))));
        s.issued_at = Utc::now() - Duration::days(2);
        assert!(s.is_expired(Some(Duration::days(1))));
        assert!(!s.is_expired(None));
    }

    #[test]
    fn test_empty_store_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::on_disk(dir.path());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_persistent_session_survives_new_store() {
        let dir = tempfile::tempdir().unwrap();
        let s = session("a@b.com");
        SessionStore::on_disk(dir.path()).save(&s, true).unwrap();

        let (loaded, scope) = SessionStore::on_disk(dir.path()).load_with_scope().unwrap();
        assert_eq!(loaded.token, "T");
        assert_eq!(loaded.user.email, "a@b.com");
        assert_eq!(loaded.issued_at, s.issued_at);
        assert_eq!(scope, SessionScope::Persistent);
    }

    #[test]
    fn test_ephemeral_session_not_visible_to_new_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::on_disk(dir.path());
        store.save(&session("a@b.com"), false).unwrap();

        let (loaded, scope) = store.load_with_scope().unwrap();
        assert_eq!(loaded.user.email, "a@b.com");
        assert_eq!(scope, SessionScope::Ephemeral);

        assert!(SessionStore::on_disk(dir.path()).load().is_none());
        assert!(!dir.path().join(TOKEN_KEY).exists());
    }

    #[test]
    fn test_ephemeral_save_removes_persisted_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::on_disk(dir.path());
        store.save(&session("old@b.com"), true).unwrap();
        store.save(&session("new@b.com"), false).unwrap();

        assert_eq!(store.load().unwrap().user.email, "new@b.com");
        assert!(SessionStore::on_disk(dir.path()).load().is_none());
    }

    /// Disk whose first `remove` fails, then behaves normally.
    struct FlakyRemoveStorage {
        inner: MemoryStorage,
        failures: std::sync::atomic::AtomicUsize,
    }

    impl Storage for FlakyRemoveStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            use std::sync::atomic::Ordering;
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                anyhow::bail!("disk busy");
            }
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_ephemeral_save_retries_removing_remembered_session() {
        let disk = std::sync::Arc::new(FlakyRemoveStorage {
            inner: MemoryStorage::new(),
            failures: std::sync::atomic::AtomicUsize::new(0),
        });
        let store = SessionStore::new(SharedStorage(disk.clone()), MemoryStorage::new());
        store.save(&session("old@b.com"), true).unwrap();

        disk.failures.store(1, std::sync::atomic::Ordering::SeqCst);
        store.save(&session("new@b.com"), false).unwrap();

        assert_eq!(disk.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(disk.get(USER_KEY).unwrap(), None);
        let (loaded, scope) = store.load_with_scope().unwrap();
        assert_eq!(loaded.user.email, "new@b.com");
        assert_eq!(scope, SessionScope::Ephemeral);
    }

    #[test]
    fn test_ephemeral_save_reports_stuck_remembered_session() {
        let disk = std::sync::Arc::new(FlakyRemoveStorage {
            inner: MemoryStorage::new(),
            failures: std::sync::atomic::AtomicUsize::new(0),
        });
        let store = SessionStore::new(SharedStorage(disk.clone()), MemoryStorage::new());
        store.save(&session("old@b.com"), true).unwrap();

        disk.failures.store(usize::MAX, std::sync::atomic::Ordering::SeqCst);
        assert!(store.save(&session("new@b.com"), false).is_err());

        // This process still sees the new user.
        assert_eq!(store.load().unwrap().user.email, "new@b.com");
    }

    /// Lets a test keep a handle on storage owned by the store.
    struct SharedStorage(std::sync::Arc<FlakyRemoveStorage>);

    impl Storage for SharedStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.0.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.0.remove(key)
        }
    }

    #[test]
    fn test_persistent_save_replaces_ephemeral_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::on_disk(dir.path());
        store.save(&session("old@b.com"), false).unwrap();
        store.save(&session("new@b.com"), true).unwrap();

        let (loaded, scope) = store.load_with_scope().unwrap();
        assert_eq!(loaded.user.email, "new@b.com");
        assert_eq!(scope, SessionScope::Persistent);
    }

    #[test]
    fn test_token_key_holds_raw_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::on_disk(dir.path());
        store.save(&Session::new("abc.def.ghi", User::new("a@b.com")), true).unwrap();
        let raw = std::fs::read_to_string(dir.path().join(TOKEN_KEY)).unwrap();
        assert_eq!(raw, "abc.def.ghi");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::on_disk(dir.path());
        store.save(&session("a@b.com"), true).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().is_none());
        assert!(SessionStore::on_disk(dir.path()).load().is_none());
    }

    #[test]
    fn test_malformed_user_record_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TOKEN_KEY), "T").unwrap();
        std::fs::write(dir.path().join(USER_KEY), "not json").unwrap();

        let store = SessionStore::on_disk(dir.path());
        assert!(store.load().is_none());
        assert!(!dir.path().join(TOKEN_KEY).exists());
        assert!(!dir.path().join(USER_KEY).exists());
    }

    #[test]
    fn test_token_without_user_record_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TOKEN_KEY), "T").unwrap();
        assert!(SessionStore::on_disk(dir.path()).load().is_none());
    }

    #[test]
    fn test_empty_token_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::on_disk(dir.path());
        store.save(&session("a@b.com"), true).unwrap();
        std::fs::write(dir.path().join(TOKEN_KEY), "  ").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_expired_session_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session("a@b.com");
        s.issued_at = Utc::now() - Duration::days(31);
        SessionStore::on_disk(dir.path()).save(&s, true).unwrap();

        let store = SessionStore::on_disk(dir.path()).with_max_age(Some(Duration::days(30)));
        assert!(store.load().is_none());
        assert!(!dir.path().join(TOKEN_KEY).exists());
    }

    #[test]
    fn test_user_record_keeps_name() {
        let dir = tempfile::tempdir().unwrap();
        let user = User {
            email: "a@b.com".to_string(),
            name: Some("Kim".to_string()),
        };
        SessionStore::on_disk(dir.path())
            .save(&Session::new("T", user.clone()), true)
            .unwrap();
        assert_eq!(SessionStore::on_disk(dir.path()).load().unwrap().user, user);
    }
}
