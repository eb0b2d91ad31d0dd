use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transport::TransportError;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status
    #[error("{message}")]
    Server { status: StatusCode, message: String },

    /// No response reached the client
    #[error("Network error. Please check your connection.")]
    Network(#[source] TransportError),

    /// A 2xx body that does not match the declared response type
    #[error("Failed to decode response ({status}): {source}")]
    Decode {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    /// The request could not be built (bad URL, header, or payload)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status of the failure; `0` when no response was received
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Server { status, .. } | ApiError::Decode { status, .. } => status.as_u16(),
            ApiError::Network(_) | ApiError::InvalidRequest(_) => 0,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Server { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    pub fn structured(&self) -> StructuredError {
        StructuredError {
            status: self.status(),
            message: self.message(),
        }
    }
}

/// Plain status/message view of an [`ApiError`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredError {
    pub status: u16,
    pub message: String,
}

impl StructuredError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<&ApiError> for StructuredError {
    fn from(err: &ApiError) -> Self {
        err.structured()
    }
}

/// Input rejected before any request is made
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{0}")]
    Invalid(String),
}

impl ValidationError {
    pub(crate) fn require(field: &'static str, value: &str) -> Result<(), Self> {
        if value.trim().is_empty() {
            return Err(Self::Required { field });
        }
        Ok(())
    }

    pub(crate) fn max_chars(field: &'static str, value: &str, max: usize) -> Result<(), Self> {
        if value.chars().count() > max {
            return Err(Self::TooLong { field, max });
        }
        Ok(())
    }

    pub(crate) fn positive(field: &'static str, value: Option<f64>) -> Result<(), Self> {
        match value {
            Some(v) if v <= 0.0 => Err(Self::NotPositive { field }),
            _ => Ok(()),
        }
    }

    pub(crate) fn within(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), Self> {
        if value < min || value > max {
            return Err(Self::OutOfRange { field, min, max });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_shape() {
        let err = ApiError::Network(TransportError::Other("connection refused".into()));

        assert_eq!(err.status(), 0);
        assert_eq!(err.message(), NETWORK_ERROR_MESSAGE);
        assert_eq!(err.structured(), StructuredError::new(0, NETWORK_ERROR_MESSAGE));
    }

    #[test]
    fn test_server_error_shape() {
        let err = ApiError::Server {
            status: StatusCode::NOT_FOUND,
            message: "Kid not found".to_string(),
        };

        assert_eq!(err.structured(), StructuredError::new(404, "Kid not found"));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_validation_helpers() {
        assert_eq!(
            ValidationError::require("name", "  "),
            Err(ValidationError::Required { field: "name" })
        );
        assert!(ValidationError::max_chars("name", "하늘", 2).is_ok());
        assert!(ValidationError::max_chars("name", "abc", 2).is_err());
        assert!(ValidationError::positive("height_cm", Some(0.0)).is_err());
        assert!(ValidationError::positive("height_cm", None).is_ok());
        assert!(ValidationError::within("temperature", 42.0, 35.0, 42.0).is_ok());
        assert!(ValidationError::within("temperature", 42.1, 35.0, 42.0).is_err());
    }
}
