//! # Votes Repository
//! This crate provides the storage-adapter boundary for the vote ledger and the
//! post aggregate. It includes the typed error classification, the
//! transaction-scoped interfaces, and concrete implementations for PostgreSQL
//! and for process memory.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;

pub use errors::VoteRepositoryError;
pub use interfaces::{VoteStore, VoteTransaction};
pub use memory::MemoryVoteStore;
pub use postgres::PostgresVoteStore;
