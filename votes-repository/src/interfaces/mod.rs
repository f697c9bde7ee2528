//! This module defines and re-exports the interfaces for the votes repository.
mod vote_store;

pub use vote_store::{VoteStore, VoteTransaction};
