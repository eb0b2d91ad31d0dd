use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub use reqwest::Method;

use crate::error::ValidationError;

/// A typed call against one backend endpoint
pub trait Request {
    type Data: Serialize;
    type Response: DeserializeOwned;
    const METHOD: Method = Method::GET;

    /// Path relative to the gateway's base address, including `/api/v1`
    fn endpoint(&self) -> Cow<'_, str>;

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Empty
    }

    /// Client-side checks run by callers before the request is sent
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum RequestData<T> {
    Empty,
    Query(T),
    Json(T),
    Multipart(Upload),
}

/// Response type for endpoints that answer with an empty body
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyResponse {}

/// A single file sent as a multipart form part
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            field_name: "file".to_string(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    /// Guess the image content type from a file extension
    pub fn image_content_type(file_name: &str) -> Option<&'static str> {
        let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            "gif" => Some("image/gif"),
            "webp" => Some("image/webp"),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("field_name", &self.field_name)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Flatten a serializable value into string query pairs.
///
/// `None` fields are dropped and sequences repeat their key.
pub(crate) fn query_pairs<T: Serialize + ?Sized>(
    data: &T,
) -> Result<Vec<(String, String)>, serde_json::Error> {
    let value = serde_json::to_value(data)?;
    let mut pairs = Vec::new();

    if let serde_json::Value::Object(map) = value {
        for (key, value) in map {
            match value {
                serde_json::Value::Array(items) => {
                    for item in items {
                        if let Some(item) = query_value(item) {
                            pairs.push((key.clone(), item));
                        }
                    }
                }
                other => {
                    if let Some(value) = query_value(other) {
                        pairs.push((key, value));
                    }
                }
            }
        }
    }

    Ok(pairs)
}

fn query_value(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
