use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::UserId;

/// Identifier of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub i32);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for PostId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// Authored content carrying the denormalized vote score.
///
/// `points` always equals the sum of the ledger values referencing this post.
/// Only the vote service mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub creator_id: UserId,
    pub title: String,
    pub text: String,
    pub points: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload accepted by the post collaborator. New posts start at zero points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub creator_id: UserId,
    pub title: String,
    pub text: String,
}
