use std::sync::Arc;
use todoc_api::endpoints::KidId;
use todoc_session::storage::{ONBOARDING_COMPLETED_KEY, SELECTED_KID_KEY};
use todoc_session::{KeyValueStore, SessionError, SessionStore};

/// Where a user lands after startup or a session change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Onboarding,
    Home,
}

/// First-run state kept beside the session tokens
pub struct Onboarding {
    storage: Arc<dyn KeyValueStore>,
}

impl Onboarding {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    pub fn route(&self, session: &SessionStore) -> Result<Route, SessionError> {
        if !session.is_authenticated() {
            return Ok(Route::Login);
        }
        if self.is_completed()? {
            Ok(Route::Home)
        } else {
            Ok(Route::Onboarding)
        }
    }

    pub fn is_completed(&self) -> Result<bool, SessionError> {
        Ok(self.storage.get(ONBOARDING_COMPLETED_KEY)?.as_deref() == Some("true"))
    }

    /// Unparseable stored values read as no selection
    pub fn selected_kid(&self) -> Result<Option<KidId>, SessionError> {
        let raw = self.storage.get(SELECTED_KID_KEY)?;
        Ok(raw.and_then(|value| match value.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!("Ignoring invalid stored kid id '{}'", value);
                None
            }
        }))
    }

    pub fn complete(&self, kid_id: KidId) -> Result<(), SessionError> {
        self.select_kid(kid_id)?;
        self.storage.set(ONBOARDING_COMPLETED_KEY, "true")?;
        tracing::info!("Onboarding completed with kid {}", kid_id);
        Ok(())
    }

    pub fn select_kid(&self, kid_id: KidId) -> Result<(), SessionError> {
        self.storage.set(SELECTED_KID_KEY, &kid_id.to_string())
    }

    pub fn reset(&self) -> Result<(), SessionError> {
        self.storage.remove(ONBOARDING_COMPLETED_KEY)?;
        self.storage.remove(SELECTED_KID_KEY)
    }
}
