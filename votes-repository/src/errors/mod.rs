//! Error types for the votes repository.
//! Consolidates and re-exports the typed storage errors.
mod vote_repository;

pub use vote_repository::VoteRepositoryError;
