//! Errors surfaced to callers of the API client.

use thiserror::Error;

/// Failure of an API call, after the session layer has applied its policy.
///
/// Only [`ApiError::AuthorizationExpired`] is silent: by the time a caller
/// sees it, the session has been torn down and the login redirect issued.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("session expired: request to {path} was unauthorized")]
    AuthorizationExpired { path: String },

    #[error("authentication rejected ({status}): {message}")]
    AuthenticationRejected { status: u16, message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthenticationRejected { status, .. } | ApiError::Api { status, .. } => Some(*status),
            ApiError::AuthorizationExpired { .. } => Some(authos_auth::UNAUTHORIZED),
            ApiError::Transport(_) | ApiError::Decode(_) => None,
        }
    }

    /// Whether the error must not be shown to the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, ApiError::AuthorizationExpired { .. })
    }

    /// Text to show the user, `None` for silent errors.
    pub fn user_message(&self) -> Option<String> {
        match self {
            ApiError::AuthorizationExpired { .. } => None,
            ApiError::AuthenticationRejected { message, .. } | ApiError::Api { message, .. } => {
                Some(message.clone())
            }
            ApiError::Transport(_) | ApiError::Decode(_) => Some(self.to_string()),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
