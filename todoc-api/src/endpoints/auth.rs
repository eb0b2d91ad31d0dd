use super::{UserId, timestamp};
use crate::error::ValidationError;
use crate::request::{Method, Request, RequestData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use todoc_session::Credentials;

pub const AUTH_PATH: &str = "/api/v1/auth";

// Common

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl From<TokenResponse> for Credentials {
    fn from(tokens: TokenResponse) -> Self {
        let credentials = Credentials::new(tokens.access_token);
        match tokens.refresh_token {
            Some(refresh_token) => credentials.with_refresh_token(refresh_token),
            None => credentials,
        }
    }
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("token_type", &self.token_type)
            .finish()
    }
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    ValidationError::require("email", email)?;
    if !email.contains('@') {
        return Err(ValidationError::Invalid("email must be a valid address".into()));
    }
    Ok(())
}

// Requests

#[derive(Clone, Serialize)]
pub struct Login {
    email: String,
    password: String,
}

impl Login {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Login")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Request for Login {
    type Data = Self;
    type Response = TokenResponse;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/login", AUTH_PATH).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Json(self)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        ValidationError::require("password", &self.password)
    }
}

#[derive(Clone, Serialize)]
pub struct Signup {
    email: String,
    password: String,
    username: String,
}

impl Signup {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            username: username.into(),
        }
    }
}

impl std::fmt::Debug for Signup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signup")
            .field("email", &self.email)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Request for Signup {
    type Data = Self;
    type Response = User;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/signup", AUTH_PATH).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Json(self)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        ValidationError::require("username", &self.username)?;
        ValidationError::max_chars("username", &self.username, 50)?;
        if self.password.chars().count() < 8 {
            return Err(ValidationError::Invalid(
                "password must be at least 8 characters".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct Me;

impl Request for Me {
    type Data = ();
    type Response = User;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/me", AUTH_PATH).into()
    }
}

#[derive(Clone, Serialize)]
pub struct RefreshToken {
    refresh_token: String,
}

impl RefreshToken {
    pub fn new(refresh_token: impl Into<String>) -> Self {
        Self {
            refresh_token: refresh_token.into(),
        }
    }
}

impl std::fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RefreshToken([REDACTED])")
    }
}

impl Request for RefreshToken {
    type Data = Self;
    type Response = TokenResponse;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/refresh", AUTH_PATH).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Json(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_into_credentials() {
        let tokens: TokenResponse = serde_json::from_str(
            r#"{"access_token":"a1","refresh_token":"r1","token_type":"bearer"}"#,
        )
        .unwrap();
        let credentials: Credentials = tokens.into();

        assert_eq!(credentials, Credentials::new("a1").with_refresh_token("r1"));
    }

    #[test]
    fn test_token_response_without_refresh_token() {
        let tokens: TokenResponse = serde_json::from_str(r#"{"access_token":"a1"}"#).unwrap();
        assert_eq!(tokens.token_type, "bearer");

        let credentials: Credentials = tokens.into();
        assert_eq!(credentials.refresh_token, None);
    }

    #[test]
    fn test_login_validation() {
        assert!(Login::new("mom@example.com", "secret").validate().is_ok());
        assert!(Login::new("", "secret").validate().is_err());
        assert!(Login::new("not-an-email", "secret").validate().is_err());
        assert!(Login::new("mom@example.com", "").validate().is_err());
    }

    #[test]
    fn test_login_debug_hides_password() {
        let debug = format!("{:?}", Login::new("mom@example.com", "hunter22"));
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn test_signup_requires_long_password() {
        assert!(Signup::new("mom@example.com", "short", "mom").validate().is_err());
        assert!(Signup::new("mom@example.com", "longenough", "mom").validate().is_ok());
    }
}
