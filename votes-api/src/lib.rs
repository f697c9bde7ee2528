//! Votes API Library
//!
//! This library provides the HTTP surface of the vote service, including
//! configuration management, error handling, and dependency wiring.

pub mod config;
pub mod errors;
pub mod server;

pub use config::{Dependencies, Settings};
pub use errors::ApiError;
