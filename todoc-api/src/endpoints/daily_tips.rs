use super::{API_PREFIX, timestamp};
use crate::error::ValidationError;
use crate::request::{Request, RequestData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Kor,
    Eng,
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kor" | "ko" => Ok(Self::Kor),
            "eng" | "en" => Ok(Self::Eng),
            other => Err(ValidationError::Invalid(format!(
                "language must be 'kor' or 'eng', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTip {
    pub id: i64,
    pub content: String,
    pub language: Language,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// A random tip in the given language; `None` when there are no tips
#[derive(Debug, Clone, Default, Serialize)]
pub struct RandomTip {
    language: Language,
}

impl RandomTip {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

impl Request for RandomTip {
    type Data = Self;
    type Response = Option<DailyTip>;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/daily-tips/random", API_PREFIX).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::query_pairs;

    #[test]
    fn test_random_tip_query_defaults_to_korean() {
        let pairs = query_pairs(&RandomTip::default()).unwrap();
        assert_eq!(pairs, vec![("language".to_string(), "kor".to_string())]);
    }

    #[test]
    fn test_null_body_is_no_tip() {
        let tip: Option<DailyTip> = serde_json::from_str("null").unwrap();
        assert_eq!(tip, None);
    }
}
