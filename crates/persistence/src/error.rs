//! Persistence error types and database error classification.

use thiserror::Error;

/// SQLSTATE raised when a row fails a CHECK constraint.
pub const CHECK_VIOLATION: &str = "23514";

/// SQLSTATE raised when a row references a missing parent.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Errors raised while opening a repository.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Invalid database configuration: {0}")]
    InvalidConfig(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The check constraint that rejected a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    EmailFormat,
    PhoneFormat,
    Other(String),
}

impl ConstraintKind {
    /// Maps a constraint name reported by the server to a known kind.
    pub fn from_constraint_name(name: Option<&str>) -> Self {
        match name {
            Some("email_format") => ConstraintKind::EmailFormat,
            Some("phone_format") => ConstraintKind::PhoneFormat,
            Some(other) => ConstraintKind::Other(other.to_string()),
            None => ConstraintKind::Other(String::new()),
        }
    }

    /// Human-readable diagnostic for the rejected input.
    pub fn user_message(&self) -> &'static str {
        match self {
            ConstraintKind::EmailFormat => {
                "Failed to save the client: the email address has an invalid format. Check the input and try again."
            }
            ConstraintKind::PhoneFormat => {
                "Failed to save the phone: the phone number has an invalid format. Check the input and try again."
            }
            ConstraintKind::Other(_) => {
                "Failed to save the record: the data was rejected by the database. Check the input and try again."
            }
        }
    }
}

/// Returns the violated constraint if `err` is a CHECK violation.
pub fn check_violation(err: &sqlx::Error) -> Option<ConstraintKind> {
    let db_err = err.as_database_error()?;
    if db_err.code().as_deref() != Some(CHECK_VIOLATION) {
        return None;
    }
    Some(ConstraintKind::from_constraint_name(db_err.constraint()))
}

/// Returns true if `err` is a foreign key violation.
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code == FOREIGN_KEY_VIOLATION)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_kind_from_name() {
        assert_eq!(
            ConstraintKind::from_constraint_name(Some("email_format")),
            ConstraintKind::EmailFormat
        );
        assert_eq!(
            ConstraintKind::from_constraint_name(Some("phone_format")),
            ConstraintKind::PhoneFormat
        );
        assert_eq!(
            ConstraintKind::from_constraint_name(Some("client_id_positive")),
            ConstraintKind::Other("client_id_positive".to_string())
        );
        assert_eq!(
            ConstraintKind::from_constraint_name(None),
            ConstraintKind::Other(String::new())
        );
    }

    #[test]
    fn test_user_messages_name_the_field() {
        assert!(ConstraintKind::EmailFormat.user_message().contains("email"));
        assert!(ConstraintKind::PhoneFormat.user_message().contains("phone"));
    }

    #[test]
    fn test_non_database_errors_are_not_classified() {
        let err = sqlx::Error::RowNotFound;
        assert!(check_violation(&err).is_none());
        assert!(!is_foreign_key_violation(&err));
    }

    #[test]
    fn test_persistence_error_display() {
        let err = PersistenceError::from(sqlx::Error::PoolClosed);
        assert!(err.to_string().starts_with("Database error:"));
    }
}
