use crate::error::SessionError;
use crate::storage::{KeyValueStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Tokens obtained by the caller from the login or refresh endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }
}

impl From<&str> for Credentials {
    fn from(access_token: &str) -> Self {
        Self::new(access_token)
    }
}

impl From<String> for Credentials {
    fn from(access_token: String) -> Self {
        Self::new(access_token)
    }
}

#[derive(Debug, Default)]
struct Session {
    token: Option<SecretString>,
    refresh_token: Option<SecretString>,
}

impl Session {
    fn state(&self) -> SessionState {
        match &self.token {
            Some(token) if !token.expose_secret().is_empty() => SessionState::Authenticated,
            _ => SessionState::Anonymous,
        }
    }

    fn token_str(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose_secret())
    }
}

/// Process-wide source of truth for the bearer token.
///
/// The authentication flag is derived from the token on every read, so the
/// two cannot disagree. Every mutation writes through to durable storage
/// while holding the session lock, which keeps memory and storage in step
/// when several tasks race on `login`/`logout`.
pub struct SessionStore {
    session: RwLock<Session>,
    storage: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Create an anonymous store. Call [`SessionStore::init`] to pick up a
    /// previously persisted token.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            session: RwLock::new(Session::default()),
            storage,
        }
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    /// Rehydrate the in-memory session from durable storage
    pub fn init(&self) -> Result<SessionState, SessionError> {
        let mut session = self.write();

        let access_token = self
            .storage
            .get(ACCESS_TOKEN_KEY)?
            .filter(|token| !token.is_empty());

        match access_token {
            Some(token) => {
                let refresh_token = self.storage.get(REFRESH_TOKEN_KEY)?;
                session.token = Some(SecretString::from(token));
                session.refresh_token = refresh_token.map(SecretString::from);
                tracing::info!("Restored session from storage");
            }
            None => {
                if self.storage.get(REFRESH_TOKEN_KEY)?.is_some() {
                    tracing::warn!("Discarding refresh token stored without an access token");
                }
                self.storage.remove(ACCESS_TOKEN_KEY)?;
                self.storage.remove(REFRESH_TOKEN_KEY)?;
                *session = Session::default();
                tracing::debug!("No stored session found");
            }
        }

        Ok(session.state())
    }

    pub fn login(&self, credentials: impl Into<Credentials>) -> Result<(), SessionError> {
        let credentials = credentials.into();
        if credentials.access_token.is_empty() {
            return Err(SessionError::EmptyToken);
        }

        let mut session = self.write();
        self.store(&mut session, credentials)?;

        tracing::info!("Session authenticated");
        Ok(())
    }

    /// Refresh token of the session that issued `sent_token`.
    ///
    /// `None` once that session has been replaced or cleared.
    pub fn refresh_token_for(&self, sent_token: Option<&str>) -> Option<SecretString> {
        let session = self.session.read().unwrap_or_else(PoisonError::into_inner);
        if sent_token.is_none() || session.token_str() != sent_token {
            return None;
        }
        session
            .refresh_token
            .as_ref()
            .map(|token| SecretString::from(token.expose_secret().to_string()))
    }

    /// Swap in refreshed credentials for the session that issued
    /// `sent_token`.
    ///
    /// Returns `false` and leaves the store alone when that session was
    /// replaced or cleared while the refresh was in flight.
    pub fn renew(
        &self,
        sent_token: Option<&str>,
        credentials: impl Into<Credentials>,
    ) -> Result<bool, SessionError> {
        let credentials = credentials.into();
        if credentials.access_token.is_empty() {
            return Err(SessionError::EmptyToken);
        }

        let mut session = self.write();
        if sent_token.is_none() || session.token_str() != sent_token {
            tracing::debug!("Discarding refreshed token for a superseded session");
            return Ok(false);
        }
        self.store(&mut session, credentials)?;

        tracing::info!("Session renewed");
        Ok(true)
    }

    /// Clear the session from memory and storage.
    ///
    /// Returns `true` only when this call moved the store from
    /// authenticated to anonymous.
    pub fn logout(&self) -> Result<bool, SessionError> {
        let mut session = self.write();
        self.clear(&mut session)
    }

    /// Log out in response to an authorization failure for a request that
    /// was sent with `sent_token`.
    ///
    /// A failure reported for a token that is no longer current leaves the
    /// newer session alone.
    pub fn expire(&self, sent_token: Option<&str>) -> Result<bool, SessionError> {
        let mut session = self.write();

        if session.token_str() != sent_token {
            tracing::debug!("Ignoring authorization failure for a superseded token");
            return Ok(false);
        }

        let cleared = self.clear(&mut session)?;
        if cleared {
            tracing::warn!("Session expired by server, logged out");
        }
        Ok(cleared)
    }

    pub fn state(&self) -> SessionState {
        self.read_state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state() == SessionState::Authenticated
    }

    pub fn token(&self) -> Option<SecretString> {
        let session = self.session.read().unwrap_or_else(PoisonError::into_inner);
        session
            .token_str()
            .map(|token| SecretString::from(token.to_string()))
    }

    pub fn refresh_token(&self) -> Option<SecretString> {
        let session = self.session.read().unwrap_or_else(PoisonError::into_inner);
        session
            .refresh_token
            .as_ref()
            .map(|token| SecretString::from(token.expose_secret().to_string()))
    }

    fn read_state(&self) -> SessionState {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state()
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, session: &mut Session, credentials: Credentials) -> Result<(), SessionError> {
        self.storage
            .set(ACCESS_TOKEN_KEY, &credentials.access_token)?;
        match &credentials.refresh_token {
            Some(refresh_token) => self.storage.set(REFRESH_TOKEN_KEY, refresh_token)?,
            None => self.storage.remove(REFRESH_TOKEN_KEY)?,
        }

        session.token = Some(SecretString::from(credentials.access_token));
        session.refresh_token = credentials.refresh_token.map(SecretString::from);
        Ok(())
    }

    fn clear(&self, session: &mut Session) -> Result<bool, SessionError> {
        let was_authenticated = session.state() == SessionState::Authenticated;

        // Memory first, so a storage failure never leaves a usable token behind
        *session = Session::default();
        self.storage.remove(ACCESS_TOKEN_KEY)?;
        self.storage.remove(REFRESH_TOKEN_KEY)?;

        if was_authenticated {
            tracing::info!("Session cleared");
        }
        Ok(was_authenticated)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> (SessionStore, MemoryStore) {
        let storage = MemoryStore::new();
        (SessionStore::new(Arc::new(storage.clone())), storage)
    }

    fn exposed(token: Option<SecretString>) -> Option<String> {
        token.map(|t| t.expose_secret().to_string())
    }

    #[test]
    fn test_starts_anonymous() {
        let (session, _) = store();
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_login_persists_token() {
        let (session, storage) = store();

        session.login("abc123").unwrap();

        assert!(session.is_authenticated());
        assert_eq!(exposed(session.token()).as_deref(), Some("abc123"));
        assert_eq!(
            storage.get(ACCESS_TOKEN_KEY).unwrap().as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_login_rejects_empty_token() {
        let (session, storage) = store();

        assert!(matches!(session.login(""), Err(SessionError::EmptyToken)));
        assert!(!session.is_authenticated());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_login_without_refresh_token_drops_stale_one() {
        let (session, storage) = store();

        session
            .login(Credentials::new("a1").with_refresh_token("r1"))
            .unwrap();
        session.login("a2").unwrap();

        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap(), None);
        assert!(session.refresh_token().is_none());
    }

    #[test]
    fn test_logout_clears_memory_and_storage() {
        let (session, storage) = store();
        session
            .login(Credentials::new("abc123").with_refresh_token("r1"))
            .unwrap();

        assert!(session.logout().unwrap());

        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.token().is_none());
        assert!(session.refresh_token().is_none());
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let (session, _) = store();
        session.login("abc123").unwrap();

        assert!(session.logout().unwrap());
        assert!(!session.logout().unwrap());
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_login_then_init_round_trip() {
        let (session, storage) = store();
        session.login("abc123").unwrap();

        // Simulate a process restart against the same storage
        let reloaded = SessionStore::new(Arc::new(storage));
        assert_eq!(reloaded.init().unwrap(), SessionState::Authenticated);
        assert_eq!(exposed(reloaded.token()).as_deref(), Some("abc123"));

        // Re-running init on an authenticated store is a no-op
        assert_eq!(session.init().unwrap(), SessionState::Authenticated);
        assert_eq!(exposed(session.token()).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_without_init_stored_token_is_ignored() {
        let storage = MemoryStore::new();
        storage.set(ACCESS_TOKEN_KEY, "abc123").unwrap();

        let session = SessionStore::new(Arc::new(storage));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_init_purges_orphaned_refresh_token() {
        let storage = MemoryStore::new();
        storage.set(REFRESH_TOKEN_KEY, "orphan").unwrap();

        let session = SessionStore::new(Arc::new(storage.clone()));
        assert_eq!(session.init().unwrap(), SessionState::Anonymous);
        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_init_treats_empty_token_as_absent() {
        let storage = MemoryStore::new();
        storage.set(ACCESS_TOKEN_KEY, "").unwrap();

        let session = SessionStore::new(Arc::new(storage.clone()));
        assert_eq!(session.init().unwrap(), SessionState::Anonymous);
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_expire_ignores_superseded_token() {
        let (session, _) = store();
        session.login("old").unwrap();
        session.login("new").unwrap();

        assert!(!session.expire(Some("old")).unwrap());
        assert_eq!(exposed(session.token()).as_deref(), Some("new"));
    }

    #[test]
    fn test_renew_replaces_the_issuing_session() {
        let (session, storage) = store();
        session
            .login(Credentials::new("old").with_refresh_token("r1"))
            .unwrap();

        assert_eq!(exposed(session.refresh_token_for(Some("old"))).as_deref(), Some("r1"));
        assert!(session
            .renew(Some("old"), Credentials::new("new").with_refresh_token("r2"))
            .unwrap());

        assert_eq!(exposed(session.token()).as_deref(), Some("new"));
        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r2"));
    }

    #[test]
    fn test_renew_leaves_a_newer_session_alone() {
        let (session, storage) = store();
        session
            .login(Credentials::new("stale").with_refresh_token("r_stale"))
            .unwrap();
        session
            .login(Credentials::new("fresh").with_refresh_token("r_fresh"))
            .unwrap();

        assert!(session.refresh_token_for(Some("stale")).is_none());
        assert!(session.refresh_token_for(None).is_none());
        assert!(!session.renew(Some("stale"), "minted").unwrap());

        assert_eq!(exposed(session.token()).as_deref(), Some("fresh"));
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("fresh"));
        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r_fresh"));
    }

    #[test]
    fn test_expire_current_token_logs_out_once() {
        let (session, _) = store();
        session.login("abc123").unwrap();

        assert!(session.expire(Some("abc123")).unwrap());
        assert!(!session.expire(Some("abc123")).unwrap());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_concurrent_expire_transitions_once() {
        let (session, _) = store();
        session.login("abc123").unwrap();
        let session = Arc::new(session);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let session = session.clone();
                std::thread::spawn(move || session.expire(Some("abc123")).unwrap())
            })
            .collect();

        let transitions = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|cleared| *cleared)
            .count();

        assert_eq!(transitions, 1);
        assert!(!session.is_authenticated());
    }
}
