//! Caller identity handed to the vote service.
//!
//! The service never reaches for a session store itself. The API layer
//! resolves the caller however it likes and passes the capability in through a
//! `RequestContext`.
use std::sync::Arc;

use votes_shared::types::UserId;

use crate::errors::VoteError;

/// Resolves the user behind the current request.
pub trait IdentityProvider: Send + Sync {
    /// Returns the authenticated user, or `None` for anonymous callers.
    fn user_id(&self) -> Option<UserId>;
}

/// An identity that was already resolved upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedIdentity(pub Option<UserId>);

impl IdentityProvider for ResolvedIdentity {
    fn user_id(&self) -> Option<UserId> {
        self.0
    }
}

/// Per-request context carrying the identity capability.
#[derive(Clone)]
pub struct RequestContext {
    identity: Arc<dyn IdentityProvider>,
}

impl RequestContext {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    /// Context for a caller already known to be `user_id`.
    pub fn authenticated(user_id: UserId) -> Self {
        Self::new(Arc::new(ResolvedIdentity(Some(user_id))))
    }

    /// Context for a caller without identity.
    pub fn anonymous() -> Self {
        Self::new(Arc::new(ResolvedIdentity(None)))
    }

    /// The caller's user id, if any.
    pub fn user_id(&self) -> Option<UserId> {
        self.identity.user_id()
    }

    /// The caller's user id, or `VoteError::Unauthenticated`.
    pub fn require_user(&self) -> Result<UserId, VoteError> {
        self.user_id().ok_or(VoteError::Unauthenticated)
    }
}
