//! Error types for the vote service.
mod vote;

pub use vote::VoteError;
