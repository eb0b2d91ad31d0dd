use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use todoc_api::endpoints::auth::User;
use todoc_api::{Gateway, ReqwestTransport, Request};
use todoc_session::{FileStore, KeyValueStore, SessionState, SessionStore, Settings};

use crate::error::AppError;
use crate::onboarding::{Onboarding, Route};
use crate::services::{call, ChatService, CommunityService, KidService, RecordService, TipService};

/// Wires settings, durable storage, the session and the gateway together
pub struct App {
    gateway: Arc<Gateway>,
    onboarding: Onboarding,
}

impl App {
    pub fn new(settings: &Settings) -> Result<Self> {
        settings
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

        let storage: Arc<dyn KeyValueStore> = match &settings.storage_path {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => Arc::new(FileStore::new()?),
        };

        let session = Arc::new(SessionStore::new(storage.clone()));
        let state = session.init().context("Failed to restore session")?;
        tracing::info!("Session restored as {:?}", state);

        let transport = match settings.timeout_secs {
            Some(secs) => ReqwestTransport::with_timeout(Duration::from_secs(secs))?,
            None => ReqwestTransport::new(),
        };

        let gateway = Gateway::with_transport(&settings.api_url, session, Arc::new(transport))
            .silent_refresh(settings.silent_refresh);
        tracing::info!("Using backend at {}", gateway.base_url());

        Ok(Self::from_parts(Arc::new(gateway), Onboarding::new(storage)))
    }

    pub fn from_parts(gateway: Arc<Gateway>, onboarding: Onboarding) -> Self {
        Self {
            gateway,
            onboarding,
        }
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    pub fn session(&self) -> &SessionStore {
        self.gateway.session()
    }

    pub fn onboarding(&self) -> &Onboarding {
        &self.onboarding
    }

    pub fn route(&self) -> Result<Route, AppError> {
        Ok(self.onboarding.route(self.session())?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AppError> {
        let tokens = call(&self.gateway, Request::auth().login(email.trim(), password)).await?;
        self.session().login(tokens)?;

        let user = call(&self.gateway, Request::auth().me()).await?;
        tracing::info!("Logged in as user {}", user.id);
        Ok(user)
    }

    /// Create an account, then sign in with it
    pub async fn signup(&self, email: &str, password: &str, username: &str) -> Result<User, AppError> {
        let request = Request::auth().signup(email.trim(), password, username.trim());
        let user = call(&self.gateway, request).await?;
        tracing::info!("Registered user {}", user.id);

        self.login(email, password).await
    }

    /// Clear the session and the onboarding progress tied to it
    pub fn logout(&self) -> Result<bool, AppError> {
        let was_authenticated = self.session().logout()?;
        self.onboarding.reset()?;
        Ok(was_authenticated)
    }

    pub async fn me(&self) -> Result<User, AppError> {
        call(&self.gateway, Request::auth().me()).await
    }

    pub fn state(&self) -> SessionState {
        self.session().state()
    }

    pub fn kids(&self) -> KidService {
        KidService::new(self.gateway.clone())
    }

    pub fn records(&self, kid_id: i64) -> RecordService {
        RecordService::new(self.gateway.clone(), kid_id)
    }

    pub fn chat(&self) -> ChatService {
        ChatService::new(self.gateway.clone())
    }

    pub fn community(&self) -> CommunityService {
        CommunityService::new(self.gateway.clone())
    }

    pub fn tips(&self) -> TipService {
        TipService::new(self.gateway.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings_in(dir: &TempDir) -> Settings {
        Settings {
            storage_path: Some(dir.path().join("storage.json")),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_restores_stored_session() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(&dir);
        let store = FileStore::open(dir.path().join("storage.json")).unwrap();
        store.set("access_token", "abc123").unwrap();

        let app = App::new(&settings).unwrap();

        assert_eq!(app.state(), SessionState::Authenticated);
        assert_eq!(app.route().unwrap(), Route::Onboarding);
    }

    #[test]
    fn test_new_starts_anonymous_without_storage() {
        let dir = TempDir::new().unwrap();

        let app = App::new(&settings_in(&dir)).unwrap();

        assert_eq!(app.state(), SessionState::Anonymous);
        assert_eq!(app.route().unwrap(), Route::Login);
    }

    #[test]
    fn test_new_survives_corrupt_storage() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("storage.json"), r#"{"access_token": "abc"#).unwrap();

        let app = App::new(&settings_in(&dir)).unwrap();

        assert_eq!(app.state(), SessionState::Anonymous);
        assert_eq!(app.route().unwrap(), Route::Login);
        assert!(!app.logout().unwrap());
    }

    #[test]
    fn test_new_rejects_invalid_settings() {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            api_url: "localhost:8000".to_string(),
            ..settings_in(&dir)
        };

        assert!(App::new(&settings).is_err());
    }
}
