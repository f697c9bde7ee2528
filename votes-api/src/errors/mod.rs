//! Error types for the Votes API application.
//! Covers everything that can stop the server from starting or serving.
use votes_repository::VoteRepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Repository error: {0}")]
    Repository(#[from] VoteRepositoryError),
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

impl ApiError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
