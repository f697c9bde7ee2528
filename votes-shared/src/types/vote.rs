use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{PostId, UserId};

/// Raised when an integer does not describe a vote direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid vote value {0}, expected 1 or -1")]
pub struct InvalidVoteValue(pub i32);

/// The sign of a vote.
///
/// Serialized as the plain integers `1` and `-1`. There is no neutral
/// direction: the absence of a ledger entry is what "no vote" means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum VoteDirection {
    /// Indicates an upvote, stored as `+1`.
    Up,
    /// Indicates a downvote, stored as `-1`.
    Down,
}

impl VoteDirection {
    /// Returns the ledger value for this direction.
    pub fn value(self) -> i32 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

impl TryFrom<i32> for VoteDirection {
    type Error = InvalidVoteValue;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteDirection::Up),
            -1 => Ok(VoteDirection::Down),
            other => Err(InvalidVoteValue(other)),
        }
    }
}

impl From<VoteDirection> for i32 {
    fn from(direction: VoteDirection) -> Self {
        direction.value()
    }
}

/// One user's current stance on one post.
///
/// At most one entry exists per `(user_id, post_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub user_id: UserId,
    pub post_id: PostId,
    pub direction: VoteDirection,
}

impl Vote {
    pub fn new(user_id: UserId, post_id: PostId, direction: VoteDirection) -> Self {
        Self {
            user_id,
            post_id,
            direction,
        }
    }

    /// Ledger value of the entry, always `1` or `-1`.
    pub fn value(&self) -> i32 {
        self.direction.value()
    }
}

/// State of a `(user, post)` pair as seen by the vote state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteState {
    NoVote,
    UpVoted,
    DownVoted,
}

impl From<Option<VoteDirection>> for VoteState {
    fn from(current: Option<VoteDirection>) -> Self {
        match current {
            None => VoteState::NoVote,
            Some(VoteDirection::Up) => VoteState::UpVoted,
            Some(VoteDirection::Down) => VoteState::DownVoted,
        }
    }
}

impl From<Option<&Vote>> for VoteState {
    fn from(current: Option<&Vote>) -> Self {
        current.map(|vote| vote.direction).into()
    }
}
