use thiserror::Error;

/// Errors that are safe to expose to callers of the module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MicroblogError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Internal error")]
    Internal,
}

impl MicroblogError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for MicroblogError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            e @ (UserNotFound { .. } | UnknownUsername { .. } | PostNotFound { .. }) => {
                Self::not_found(e.to_string())
            }
            e @ (UsernameTaken { .. } | EmailTaken { .. }) => Self::conflict(e.to_string()),
            e @ CannotFollowSelf => Self::validation(e.to_string()),
            e @ NotPostAuthor { .. } => Self::forbidden(e.to_string()),
            Validation { field, message } => Self::validation(format!("{field}: {message}")),
            Database { .. } => Self::internal(),
        }
    }
}
