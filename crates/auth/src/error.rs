use thiserror::Error;

/// Recoverable decode failures for persisted session records.
///
/// These never reach the user: the session layer substitutes an empty record
/// (or drops a single header) and logs the error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("malformed persisted identity under '{key}': {reason}")]
    MalformedIdentity { key: String, reason: String },

    #[error("malformed tenant record: {reason}")]
    MalformedTenant { reason: String },
}

impl SessionError {
    pub fn malformed_identity(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentity {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_tenant(reason: impl Into<String>) -> Self {
        Self::MalformedTenant {
            reason: reason.into(),
        }
    }
}
