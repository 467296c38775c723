use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not signed in")]
    NotSignedIn,
    #[error("{code:?}: {message}")]
    Api { code: ErrorCode, message: String },
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClientError {
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Api { code, .. } => Some(*code),
            ClientError::NotSignedIn => Some(ErrorCode::Unauthorized),
            _ => None,
        }
    }
}

impl From<ApiError> for ClientError {
    fn from(value: ApiError) -> Self {
        ClientError::Api {
            code: value.code,
            message: value.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("failed to start {src}: {reason}")]
    StartFailed { src: String, reason: String },
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("failed to save selection: {0}")]
    Persist(#[source] ClientError),
}

/// Outcome of a page action that did not go through.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}
