use std::path::PathBuf;
use thiserror::Error;
use todoc_api::{ApiError, StructuredError, ValidationError};
use todoc_session::SessionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Could not read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    /// The server rejected the credentials; the session is already cleared
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Api(e) if e.is_unauthorized())
    }

    /// `{status, message}` for API failures, `None` for local ones
    pub fn structured(&self) -> Option<StructuredError> {
        match self {
            AppError::Api(e) => Some(e.structured()),
            _ => None,
        }
    }
}
