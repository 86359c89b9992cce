//! Error types for the registration service

use std::fmt::Display;

use thiserror::Error;

use crate::infra::mail::MailError;
use crate::validation::FieldErrors;

#[derive(Error, Debug)]
pub enum RejsError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Input or invariant violation, reported per field
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Uniqueness violation
    #[error("conflict: {0}")]
    Conflict(String),

    /// Encryption error
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Email could not be built or delivered
    #[error("mail error: {0}")]
    Mail(#[from] MailError),

    /// Template failed to render
    #[error("template error: {0}")]
    Template(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Stored data no longer matches the schema
    #[error("corrupt row in {table}: {message}")]
    CorruptRow {
        table: &'static str,
        message: String,
    },

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl RejsError {
    pub fn not_found(entity: &'static str, id: impl Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn corrupt(table: &'static str, message: impl Into<String>) -> Self {
        Self::CorruptRow {
            table,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<FieldErrors> for RejsError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<tera::Error> for RejsError {
    fn from(err: tera::Error) -> Self {
        Self::Template(crate::templates::describe_error(&err))
    }
}

/// Result type for service operations
pub type Result<T> = std::result::Result<T, RejsError>;
