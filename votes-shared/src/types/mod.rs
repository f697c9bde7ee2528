mod post;
mod transition;
mod user;
mod vote;

pub use post::{NewPost, Post, PostId};
pub use transition::{LedgerAction, VoteTransition};
pub use user::{NewUser, User, UserId};
pub use vote::{InvalidVoteValue, Vote, VoteDirection, VoteState};
