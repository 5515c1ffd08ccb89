use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found: {id}")]
    UserNotFound { id: i64 },

    #[error("User '{username}' not found")]
    UnknownUsername { username: String },

    #[error("Post not found: {id}")]
    PostNotFound { id: i64 },

    #[error("Username '{username}' is already taken")]
    UsernameTaken { username: String },

    #[error("Email '{email}' is already registered")]
    EmailTaken { email: String },

    #[error("You cannot follow yourself")]
    CannotFollowSelf,

    #[error("Post {post_id} belongs to another user")]
    NotPostAuthor { post_id: i64 },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn user_not_found(id: i64) -> Self {
        Self::UserNotFound { id }
    }

    pub fn unknown_username(username: impl Into<String>) -> Self {
        Self::UnknownUsername {
            username: username.into(),
        }
    }

    pub fn post_not_found(id: i64) -> Self {
        Self::PostNotFound { id }
    }

    pub fn username_taken(username: impl Into<String>) -> Self {
        Self::UsernameTaken {
            username: username.into(),
        }
    }

    pub fn email_taken(email: impl Into<String>) -> Self {
        Self::EmailTaken {
            email: email.into(),
        }
    }

    pub fn not_post_author(post_id: i64) -> Self {
        Self::NotPostAuthor { post_id }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::database(e.to_string())
    }
}

impl From<db::DbError> for DomainError {
    fn from(e: db::DbError) -> Self {
        Self::database(e.to_string())
    }
}
