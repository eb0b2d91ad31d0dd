use std::sync::Arc;
use todoc_api::endpoints::chat::{AiMode, ChatMessage, ChatSession};
use todoc_api::endpoints::{KidId, SessionId};
use todoc_api::{Gateway, Request};

use super::call;
use crate::cache::ListCache;
use crate::error::AppError;

/// AI chat sessions for one kid
pub struct ChatService {
    gateway: Arc<Gateway>,
    sessions: ListCache<ChatSession>,
}

impl ChatService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            sessions: ListCache::new(),
        }
    }

    pub fn sessions(&self) -> &ListCache<ChatSession> {
        &self.sessions
    }

    pub async fn load(&mut self, kid_id: KidId) -> Result<&[ChatSession], AppError> {
        tracing::info!("Loading chat sessions for kid {}", kid_id);
        let sessions = call(&self.gateway, Request::chat().sessions(kid_id)).await?;
        self.sessions.replace_all(sessions);
        Ok(self.sessions.items())
    }

    pub async fn start(&mut self, kid_id: KidId) -> Result<ChatSession, AppError> {
        let session = call(&self.gateway, Request::chat().create_session(kid_id)).await?;
        tracing::info!("Started chat session {}", session.id);
        self.sessions.apply_created(session.clone());
        Ok(session)
    }

    /// Fetch a session with its full transcript
    pub async fn open(&mut self, session_id: SessionId) -> Result<ChatSession, AppError> {
        let mut session = call(&self.gateway, Request::chat().session(session_id)).await?;
        session
            .messages
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        self.sessions.apply_created(session.clone());
        Ok(session)
    }

    pub async fn delete(&mut self, session_id: SessionId) -> Result<(), AppError> {
        call(&self.gateway, Request::chat().delete_session(session_id)).await?;
        self.sessions.apply_deleted(session_id);
        Ok(())
    }

    /// Send a message and return the assistant's reply.
    ///
    /// The cached transcript is not touched; call [`ChatService::open`] to
    /// reload it with both sides of the exchange.
    pub async fn send(
        &self,
        session_id: SessionId,
        content: &str,
        mode: AiMode,
    ) -> Result<ChatMessage, AppError> {
        tracing::info!("Sending chat message to session {} ({:?})", session_id, mode);
        let request = Request::chat().send(session_id, content.trim()).mode(mode);
        call(&self.gateway, request).await
    }
}
