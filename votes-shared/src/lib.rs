//! # Votes Shared
//! This crate defines the plain data records shared across the votes workspace.
//! It includes users, posts, vote ledger entries, vote directions and the
//! transition table that decides how a vote request changes the ledger.
pub mod types;
