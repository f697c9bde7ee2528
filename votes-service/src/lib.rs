//! # Votes Service
//! This crate defines the vote service: the only component allowed to write
//! the vote ledger and the post `points` aggregate.
//! It includes the service itself, the caller identity capability, its
//! configuration, and the error taxonomy returned to the API layer.
pub mod config;
pub mod errors;
pub mod identity;
pub mod service;

pub use config::VoteServiceConfig;
pub use errors::VoteError;
pub use identity::{IdentityProvider, RequestContext, ResolvedIdentity};
pub use service::VoteService;
