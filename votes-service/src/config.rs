//! Configuration types for the VoteService.
use std::time::Duration;

/// Configuration for the VoteService.
///
/// Controls how often a vote transaction that lost a race is replayed before
/// the `Conflict` is handed back to the caller.
#[derive(Debug, Clone)]
pub struct VoteServiceConfig {
    /// Number of extra attempts after a `Conflict`. Zero disables retrying.
    pub max_conflict_retries: usize,

    /// Base of the exponential backoff between attempts, in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Upper bound for a single backoff delay.
    pub retry_max_delay: Duration,
}

impl Default for VoteServiceConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            retry_base_delay_ms: 10,
            retry_max_delay: Duration::from_millis(500),
        }
    }
}

impl VoteServiceConfig {
    /// Create a config that surfaces every `Conflict` immediately.
    pub fn no_retries() -> Self {
        Self {
            max_conflict_retries: 0,
            ..Self::default()
        }
    }

    /// Create a config with a custom number of conflict retries.
    pub fn with_max_conflict_retries(max_conflict_retries: usize) -> Self {
        Self {
            max_conflict_retries,
            ..Self::default()
        }
    }
}
