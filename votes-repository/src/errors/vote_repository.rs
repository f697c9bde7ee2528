//! Error types for the votes repository.
//! Raw driver errors are classified here, once, so callers only ever match on
//! the variants below.
use thiserror::Error;
use tracing::debug;

/// SQLSTATE raised when concurrent transactions cannot be serialized.
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE raised when the server aborts one side of a lock cycle.
const DEADLOCK_DETECTED: &str = "40P01";

/// Represents errors that can occur within the votes repository.
#[derive(Debug, Error)]
pub enum VoteRepositoryError {
    /// A row with the same unique key already exists, or the transaction lost a
    /// race against a concurrent one. Safe to retry.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The referenced row does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored or requested vote value is neither `1` nor `-1`.
    #[error("Invalid vote value: {0}")]
    InvalidVoteValue(i32),

    /// A CHECK constraint rejected the row.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Any other storage failure: connection loss, pool timeouts, etc.
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),
}

impl VoteRepositoryError {
    /// Create a conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<sqlx::Error> for VoteRepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let kind = if db_err.is_unique_violation() {
                Some(ViolationKind::Unique)
            } else if db_err.is_foreign_key_violation() {
                Some(ViolationKind::ForeignKey)
            } else if db_err.is_check_violation() {
                Some(ViolationKind::Check)
            } else if matches!(
                db_err.code().as_deref(),
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
            ) {
                Some(ViolationKind::Serialization)
            } else {
                None
            };

            if let Some(kind) = kind {
                // Driver text names tables and constraints; it stays in the log.
                debug!(
                    code = ?db_err.code(),
                    constraint = ?db_err.constraint(),
                    driver_message = db_err.message(),
                    "Classified database error"
                );
                return kind.into_error(db_err.constraint());
            }
        }

        match err {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".to_string()),
            other => Self::DatabaseError(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViolationKind {
    Unique,
    ForeignKey,
    Check,
    Serialization,
}

impl ViolationKind {
    /// Builds the classified error with a message of our own for `constraint`.
    fn into_error(self, constraint: Option<&str>) -> VoteRepositoryError {
        let known = match constraint {
            Some("vote_pkey") => Some("vote already exists"),
            Some("vote_user_id_fkey") => Some("unknown user"),
            Some("vote_post_id_fkey") => Some("unknown post"),
            Some("post_creator_id_fkey") => Some("unknown post creator"),
            Some("users_username_key") => Some("username already exists"),
            Some("users_username_check") => Some("username must be lowercase"),
            Some("vote_value_check") => Some("vote value must be 1 or -1"),
            _ => None,
        };

        match self {
            ViolationKind::Unique => {
                VoteRepositoryError::Conflict(known.unwrap_or("duplicate key").to_string())
            }
            ViolationKind::ForeignKey => VoteRepositoryError::NotFound(
                known.unwrap_or("referenced row does not exist").to_string(),
            ),
            ViolationKind::Check => VoteRepositoryError::ConstraintViolation(
                known.unwrap_or("row rejected by a check constraint").to_string(),
            ),
            ViolationKind::Serialization => {
                VoteRepositoryError::Conflict("concurrent transaction conflict".to_string())
            }
        }
    }
}
