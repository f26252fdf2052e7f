//! Typed failures returned by the record managers. The front end only needs to
//! tell the four kinds apart; the message inside each variant is already fit
//! for showing to the user verbatim.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordsError {
    /// Malformed or out-of-range input.
    #[error("{0}")]
    Validation(String),

    /// A referenced student, course or enrollment does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness or referential rule would be broken.
    #[error("{0}")]
    Conflict(String),

    /// Anything the persistence layer raised on its own.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl RecordsError {
    pub fn validation(message: impl Into<String>) -> Self {
        RecordsError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        RecordsError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        RecordsError::Conflict(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RecordsError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RecordsError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RecordsError::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, RecordsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_shown_verbatim() {
        let err = RecordsError::conflict("Student already exists.");
        assert_eq!(err.to_string(), "Student already exists.");
        assert!(err.is_conflict());
        assert!(!err.is_not_found());
    }

    #[test]
    fn storage_errors_keep_their_context() {
        let err: RecordsError = anyhow::anyhow!("disk full").context("failed to insert").into();
        assert!(matches!(err, RecordsError::Storage(_)));
        assert_eq!(err.to_string(), "failed to insert");
    }
}
