//! In-memory vote store for tests and local development.
//!
//! A transaction owns the store-wide lock for its whole lifetime, so memory
//! transactions are fully serialized. Writes are applied in place and recorded
//! in an undo log; dropping a transaction without committing replays the log
//! backwards.
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use votes_shared::types::{NewPost, NewUser, Post, PostId, User, UserId, Vote, VoteDirection};

use crate::{VoteRepositoryError, VoteStore, VoteTransaction};

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    posts: BTreeMap<PostId, Post>,
    votes: BTreeMap<(UserId, PostId), VoteDirection>,
    next_user_id: i32,
    next_post_id: i32,
}

impl MemoryState {
    fn post_mut(&mut self, post_id: PostId) -> Result<&mut Post, VoteRepositoryError> {
        self.posts
            .get_mut(&post_id)
            .ok_or_else(|| VoteRepositoryError::not_found(format!("post {}", post_id)))
    }
}

/// Vote store keeping users, posts and the ledger in process memory.
#[derive(Clone, Default)]
pub struct MemoryVoteStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryVoteStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VoteStore for MemoryVoteStore {
    async fn begin(&self) -> Result<Box<dyn VoteTransaction>, VoteRepositoryError> {
        let state = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryVoteTransaction {
            state,
            undo: Vec::new(),
        }))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, VoteRepositoryError> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(VoteRepositoryError::conflict(format!(
                "username {} already exists",
                user.username
            )));
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let stored = User {
            id: UserId(state.next_user_id),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, VoteRepositoryError> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&post.creator_id) {
            return Err(VoteRepositoryError::not_found(format!("user {}", post.creator_id)));
        }

        state.next_post_id += 1;
        let now = Utc::now();
        let stored = Post {
            id: PostId(state.next_post_id),
            creator_id: post.creator_id,
            title: post.title.clone(),
            text: post.text.clone(),
            points: 0,
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_post(&self, post_id: PostId) -> Result<Option<Post>, VoteRepositoryError> {
        Ok(self.state.lock().await.posts.get(&post_id).cloned())
    }

    async fn list_votes(&self, post_id: PostId) -> Result<Vec<Vote>, VoteRepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .votes
            .iter()
            .filter(|((_, p), _)| *p == post_id)
            .map(|(&(user_id, post_id), &direction)| Vote::new(user_id, post_id, direction))
            .collect())
    }
}

enum UndoEntry {
    Points { post_id: PostId, delta: i32 },
    Vote { key: (UserId, PostId), previous: Option<VoteDirection> },
}

/// Transaction over a `MemoryVoteStore`.
pub struct MemoryVoteTransaction {
    state: OwnedMutexGuard<MemoryState>,
    undo: Vec<UndoEntry>,
}

impl MemoryVoteTransaction {
    fn set_vote(&mut self, key: (UserId, PostId), direction: Option<VoteDirection>) {
        let previous = match direction {
            Some(direction) => self.state.votes.insert(key, direction),
            None => self.state.votes.remove(&key),
        };
        self.undo.push(UndoEntry::Vote { key, previous });
    }

    fn missing_vote(user_id: UserId, post_id: PostId) -> VoteRepositoryError {
        VoteRepositoryError::not_found(format!("vote of user {} on post {}", user_id, post_id))
    }
}

impl Drop for MemoryVoteTransaction {
    fn drop(&mut self) {
        while let Some(entry) = self.undo.pop() {
            match entry {
                UndoEntry::Points { post_id, delta } => {
                    if let Some(post) = self.state.posts.get_mut(&post_id) {
                        post.points -= delta;
                    }
                }
                UndoEntry::Vote { key, previous } => match previous {
                    Some(direction) => {
                        self.state.votes.insert(key, direction);
                    }
                    None => {
                        self.state.votes.remove(&key);
                    }
                },
            }
        }
    }
}

#[async_trait]
impl VoteTransaction for MemoryVoteTransaction {
    async fn lock_post(&mut self, post_id: PostId) -> Result<i32, VoteRepositoryError> {
        Ok(self.state.post_mut(post_id)?.points)
    }

    async fn adjust_points(&mut self, post_id: PostId, delta: i32) -> Result<i32, VoteRepositoryError> {
        let post = self.state.post_mut(post_id)?;
        post.points = post
            .points
            .checked_add(delta)
            .ok_or_else(|| VoteRepositoryError::ConstraintViolation(format!("points of post {} overflow", post_id)))?;
        let points = post.points;
        self.undo.push(UndoEntry::Points { post_id, delta });
        Ok(points)
    }

    async fn get_vote(
        &mut self,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<Option<Vote>, VoteRepositoryError> {
        Ok(self
            .state
            .votes
            .get(&(user_id, post_id))
            .map(|&direction| Vote::new(user_id, post_id, direction)))
    }

    async fn insert_vote(&mut self, vote: &Vote) -> Result<(), VoteRepositoryError> {
        if !self.state.users.contains_key(&vote.user_id) {
            return Err(VoteRepositoryError::not_found(format!("unknown user {}", vote.user_id)));
        }
        if !self.state.posts.contains_key(&vote.post_id) {
            return Err(VoteRepositoryError::not_found(format!("unknown post {}", vote.post_id)));
        }
        let key = (vote.user_id, vote.post_id);
        if self.state.votes.contains_key(&key) {
            return Err(VoteRepositoryError::conflict(format!(
                "vote of user {} on post {} already exists",
                vote.user_id, vote.post_id
            )));
        }
        self.set_vote(key, Some(vote.direction));
        Ok(())
    }

    async fn update_vote(
        &mut self,
        user_id: UserId,
        post_id: PostId,
        direction: VoteDirection,
    ) -> Result<(), VoteRepositoryError> {
        let key = (user_id, post_id);
        if !self.state.votes.contains_key(&key) {
            return Err(Self::missing_vote(user_id, post_id));
        }
        self.set_vote(key, Some(direction));
        Ok(())
    }

    async fn remove_vote(&mut self, user_id: UserId, post_id: PostId) -> Result<(), VoteRepositoryError> {
        let key = (user_id, post_id);
        if !self.state.votes.contains_key(&key) {
            return Err(Self::missing_vote(user_id, post_id));
        }
        self.set_vote(key, None);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), VoteRepositoryError> {
        let mut tx = self;
        tx.undo.clear();
        Ok(())
    }
}
