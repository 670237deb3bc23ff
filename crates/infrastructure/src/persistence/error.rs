//! Shared error mapping for sqlx persistence layer

use application::error::ApplicationError;

/// Map a sqlx error to an application-layer error
pub fn map_sqlx_error(e: sqlx::Error) -> ApplicationError {
    match e {
        sqlx::Error::RowNotFound => {
            ApplicationError::NotFound("Database record not found".to_string())
        },
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ApplicationError::Persistence(format!("Constraint violation: {db_err}"))
        },
        sqlx::Error::Database(db_err) => {
            ApplicationError::Persistence(format!("Database error: {db_err}"))
        },
        other => ApplicationError::Persistence(format!("Database error: {other}")),
    }
}
