//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Store unreachable, constraint violation or failed transaction
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Malformed observation or request
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested forecast does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Message channel error
    #[error("Messaging error: {0}")]
    Messaging(String),

    /// A collaborator is disabled or not running
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApplicationError::Persistence(_) | ApplicationError::Messaging(_)
        )
    }

    /// Check if this error means the input itself is bad
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ApplicationError::Validation(_)
                | ApplicationError::Domain(
                    DomainError::ValidationError(_) | DomainError::InvalidDateTime(_)
                )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_is_retryable() {
        assert!(ApplicationError::Persistence("locked".into()).is_retryable());
        assert!(ApplicationError::Messaging("down".into()).is_retryable());
        assert!(!ApplicationError::Validation("bad".into()).is_retryable());
    }

    #[test]
    fn domain_date_errors_count_as_validation() {
        let err: ApplicationError = DomainError::InvalidDateTime("soon".into()).into();
        assert!(err.is_validation());
        assert!(ApplicationError::Validation("x".into()).is_validation());
        assert!(!ApplicationError::NotFound("x".into()).is_validation());
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            ApplicationError::Persistence("disk full".into()).to_string(),
            "Persistence error: disk full"
        );
        assert_eq!(
            ApplicationError::ServiceUnavailable("scheduler".into()).to_string(),
            "Service unavailable: scheduler"
        );
    }
}
