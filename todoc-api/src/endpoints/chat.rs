use super::{API_PREFIX, KidId, SessionId, timestamp};
use crate::error::ValidationError;
use crate::request::{EmptyResponse, Method, Request, RequestData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::str::FromStr;

// Common

/// Persona the assistant answers as
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum AiMode {
    #[default]
    Doctor,
    Mom,
    Nutrition,
}

impl AiMode {
    pub fn id(self) -> u8 {
        match self {
            Self::Doctor => 1,
            Self::Mom => 2,
            Self::Nutrition => 3,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Doctor),
            2 => Some(Self::Mom),
            3 => Some(Self::Nutrition),
            _ => None,
        }
    }
}

impl FromStr for AiMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "doctor" | "1" => Ok(Self::Doctor),
            "mom" | "2" => Ok(Self::Mom),
            "nutrition" | "3" => Ok(Self::Nutrition),
            other => Err(ValidationError::Invalid(format!(
                "unknown ai mode '{}'",
                other
            ))),
        }
    }
}

impl Serialize for AiMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.id())
    }
}

impl<'de> Deserialize<'de> for AiMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = u8::deserialize(deserializer)?;
        Self::from_id(id).ok_or_else(|| serde::de::Error::custom(format!("unknown ai mode id {}", id)))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub session_id: SessionId,
    pub sender: Sender,
    #[serde(default)]
    pub ai_mode_id: Option<AiMode>,
    pub content: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: SessionId,
    pub kid_id: KidId,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

// Requests

#[derive(Debug, Clone, Serialize)]
pub struct ListSessions {
    kid_id: KidId,
}

impl ListSessions {
    pub fn new(kid_id: KidId) -> Self {
        Self { kid_id }
    }
}

impl Request for ListSessions {
    type Data = Self;
    type Response = Vec<ChatSession>;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/chat/sessions", API_PREFIX).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSession {
    kid_id: KidId,
}

impl CreateSession {
    pub fn new(kid_id: KidId) -> Self {
        Self { kid_id }
    }
}

impl Request for CreateSession {
    type Data = Self;
    type Response = ChatSession;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/chat/sessions", API_PREFIX).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Json(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetSession {
    #[serde(skip)]
    session_id: SessionId,
}

impl GetSession {
    pub fn new(session_id: SessionId) -> Self {
        Self { session_id }
    }
}

impl Request for GetSession {
    type Data = ();
    type Response = ChatSession;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/chat/sessions/{}", API_PREFIX, self.session_id).into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteSession {
    #[serde(skip)]
    session_id: SessionId,
}

impl DeleteSession {
    pub fn new(session_id: SessionId) -> Self {
        Self { session_id }
    }
}

impl Request for DeleteSession {
    type Data = ();
    type Response = EmptyResponse;
    const METHOD: Method = Method::DELETE;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/chat/sessions/{}", API_PREFIX, self.session_id).into()
    }
}

/// Post a user message; the response is the assistant's reply
#[derive(Debug, Clone, Serialize)]
pub struct SendMessage {
    #[serde(skip)]
    session_id: SessionId,
    content: String,
    ai_mode_id: AiMode,
}

impl SendMessage {
    pub fn new(session_id: SessionId, content: impl Into<String>) -> Self {
        Self {
            session_id,
            content: content.into(),
            ai_mode_id: AiMode::default(),
        }
    }

    pub fn mode(mut self, mode: AiMode) -> Self {
        self.ai_mode_id = mode;
        self
    }
}

impl Request for SendMessage {
    type Data = Self;
    type Response = ChatMessage;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/chat/sessions/{}/messages", API_PREFIX, self.session_id).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Json(self)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::require("content", &self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ai_mode_wire_ids() {
        assert_eq!(serde_json::to_value(AiMode::Nutrition).unwrap(), json!(3));
        assert_eq!(serde_json::from_value::<AiMode>(json!(2)).unwrap(), AiMode::Mom);
        assert!(serde_json::from_value::<AiMode>(json!(9)).is_err());
        assert_eq!("Doctor".parse::<AiMode>().unwrap(), AiMode::Doctor);
    }

    #[test]
    fn test_send_message_payload() {
        let request = SendMessage::new(5, "아기가 열이 나요").mode(AiMode::Mom);

        assert_eq!(request.endpoint(), "/api/v1/chat/sessions/5/messages");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"content": "아기가 열이 나요", "ai_mode_id": 2})
        );
        assert!(SendMessage::new(5, " ").validate().is_err());
    }

    #[test]
    fn test_session_decodes_with_messages() {
        let session: ChatSession = serde_json::from_value(json!({
            "id": 5,
            "kid_id": 1,
            "created_at": "2024-05-01T09:00:00",
            "messages": [
                {"id": 1, "session_id": 5, "sender": "user", "ai_mode_id": null,
                 "content": "hi", "created_at": "2024-05-01T09:00:01"},
                {"id": 2, "session_id": 5, "sender": "ai", "ai_mode_id": 1,
                 "content": "hello", "created_at": "2024-05-01T09:00:02"}
            ]
        }))
        .unwrap();

        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].sender, Sender::Ai);
        assert_eq!(session.messages[1].ai_mode_id, Some(AiMode::Doctor));
    }

    #[test]
    fn test_list_sessions_is_scoped_by_kid_query() {
        let request = ListSessions::new(7);
        assert_eq!(request.endpoint(), "/api/v1/chat/sessions");
        assert!(matches!(request.data(), RequestData::Query(_)));
    }
}
