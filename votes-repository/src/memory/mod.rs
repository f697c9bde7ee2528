//! In-memory implementation of the votes repository.
mod vote_store;

pub use vote_store::{MemoryVoteStore, MemoryVoteTransaction};
