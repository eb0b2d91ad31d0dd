use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Access token must not be empty")]
    EmptyToken,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for SessionError {
    fn from(err: config::ConfigError) -> Self {
        SessionError::Configuration(err.to_string())
    }
}
