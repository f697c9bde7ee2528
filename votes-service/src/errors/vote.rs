//! Error taxonomy of the vote service.
//! Every failure leaving the service is one of these variants; storage errors
//! are translated here and never passed through raw.
use thiserror::Error;
use votes_repository::VoteRepositoryError;
use votes_shared::types::InvalidVoteValue;

/// Represents errors returned by the `VoteService`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    /// The request carries no resolved user identity.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Unknown post, or unknown ledger entry for an update or removal.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The requested vote value is outside `{1, -1}`.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A concurrent transaction won the race for the same key.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The transaction could not commit. Nothing was applied.
    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl VoteError {
    /// Whether repeating the same request may succeed.
    ///
    /// Only `Conflict` qualifies; every other error is final for the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VoteError::Conflict(_))
    }
}

impl From<VoteRepositoryError> for VoteError {
    fn from(err: VoteRepositoryError) -> Self {
        match err {
            VoteRepositoryError::Conflict(msg) => VoteError::Conflict(msg),
            VoteRepositoryError::NotFound(msg) => VoteError::NotFound(msg),
            VoteRepositoryError::InvalidVoteValue(value) => {
                VoteError::StorageFailure(format!("ledger holds invalid vote value {}", value))
            }
            VoteRepositoryError::ConstraintViolation(msg) => VoteError::StorageFailure(msg),
            VoteRepositoryError::DatabaseError(e) => VoteError::StorageFailure(e.to_string()),
        }
    }
}

impl From<InvalidVoteValue> for VoteError {
    fn from(err: InvalidVoteValue) -> Self {
        VoteError::InvalidArgument(err.to_string())
    }
}
