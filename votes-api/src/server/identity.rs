//! Caller identity taken from request headers.
//!
//! Authentication happens in front of this server; the gateway forwards the
//! session's user id in `x-user-id`. A missing or unparsable header yields an
//! anonymous caller.
//!
//! The header is trusted as-is. The gateway must strip any client-supplied
//! `x-user-id` before setting its own, and this server must not be reachable
//! except through it.
use std::sync::Arc;

use axum::http::HeaderMap;
use votes_service::{IdentityProvider, RequestContext};
use votes_shared::types::UserId;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity resolved from the `x-user-id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderIdentity {
    user_id: Option<UserId>,
}

impl HeaderIdentity {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| raw.trim().parse::<i32>().ok())
            .map(UserId);
        Self { user_id }
    }
}

impl IdentityProvider for HeaderIdentity {
    fn user_id(&self) -> Option<UserId> {
        self.user_id
    }
}

/// Builds the service request context for the caller of this request.
pub fn caller_context(headers: &HeaderMap) -> RequestContext {
    RequestContext::new(Arc::new(HeaderIdentity::from_headers(headers)))
}
