//! PostgreSQL implementation of the votes repository.
mod vote_store;

pub use vote_store::{PostgresVoteStore, PostgresVoteTransaction};
