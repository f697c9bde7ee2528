//! This module defines the `VoteStore` and `VoteTransaction` traits, which
//! provide the interface to the vote ledger and the post aggregate.
//!
//! Every ledger and aggregate mutation happens on a `VoteTransaction`. Nothing
//! is visible to other transactions until `commit` succeeds, and dropping an
//! uncommitted transaction rolls it back.
use votes_shared::types::{NewPost, NewUser, Post, PostId, User, UserId, Vote, VoteDirection};

use crate::errors::VoteRepositoryError;

/// Entry point to the vote storage.
///
/// Implementors hand out transactions and provide the read/write boundary for
/// the post and user collaborators.
#[async_trait::async_trait]
pub trait VoteStore: Send + Sync {
    /// Opens a new transaction.
    ///
    /// # Returns
    ///
    /// * `Ok(Box<dyn VoteTransaction>)` - A transaction ready to use
    /// * `Err(VoteRepositoryError)` - The storage could not start a transaction
    async fn begin(&self) -> Result<Box<dyn VoteTransaction>, VoteRepositoryError>;

    /// Registers a user.
    ///
    /// # Returns
    ///
    /// * `Ok(User)` - The stored user with its assigned id
    /// * `Err(VoteRepositoryError::Conflict)` - The username is already taken
    async fn create_user(&self, user: &NewUser) -> Result<User, VoteRepositoryError>;

    /// Creates a post with zero points.
    ///
    /// # Returns
    ///
    /// * `Ok(Post)` - The stored post with its assigned id
    /// * `Err(VoteRepositoryError::NotFound)` - The creator does not exist
    async fn create_post(&self, post: &NewPost) -> Result<Post, VoteRepositoryError>;

    /// Looks a post up by id.
    async fn find_post(&self, post_id: PostId) -> Result<Option<Post>, VoteRepositoryError>;

    /// Lists the ledger entries referencing a post, ordered by user id.
    async fn list_votes(&self, post_id: PostId) -> Result<Vec<Vote>, VoteRepositoryError>;
}

/// A unit of work over the vote ledger and the post aggregate.
///
/// None of the methods commit on their own.
#[async_trait::async_trait]
pub trait VoteTransaction: Send {
    /// Reads a post's points and locks the post row until the transaction ends.
    ///
    /// Concurrent transactions locking the same post queue up behind this one.
    ///
    /// # Returns
    ///
    /// * `Ok(i32)` - Current points of the post
    /// * `Err(VoteRepositoryError::NotFound)` - The post does not exist
    async fn lock_post(&mut self, post_id: PostId) -> Result<i32, VoteRepositoryError>;

    /// Adds `delta` to a post's points as a storage-side increment.
    ///
    /// # Returns
    ///
    /// * `Ok(i32)` - Points after the adjustment
    /// * `Err(VoteRepositoryError::NotFound)` - The post does not exist
    async fn adjust_points(&mut self, post_id: PostId, delta: i32) -> Result<i32, VoteRepositoryError>;

    /// Reads the ledger entry for a `(user, post)` pair.
    async fn get_vote(
        &mut self,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<Option<Vote>, VoteRepositoryError>;

    /// Inserts a new ledger entry.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The entry was created
    /// * `Err(VoteRepositoryError::Conflict)` - An entry already exists for the pair
    /// * `Err(VoteRepositoryError::NotFound)` - The user or post does not exist
    async fn insert_vote(&mut self, vote: &Vote) -> Result<(), VoteRepositoryError>;

    /// Changes the direction of an existing ledger entry.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The entry was updated
    /// * `Err(VoteRepositoryError::NotFound)` - No entry exists for the pair
    async fn update_vote(
        &mut self,
        user_id: UserId,
        post_id: PostId,
        direction: VoteDirection,
    ) -> Result<(), VoteRepositoryError>;

    /// Deletes an existing ledger entry.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The entry was removed
    /// * `Err(VoteRepositoryError::NotFound)` - No entry exists for the pair
    async fn remove_vote(&mut self, user_id: UserId, post_id: PostId) -> Result<(), VoteRepositoryError>;

    /// Makes every change of this transaction durable and visible.
    async fn commit(self: Box<Self>) -> Result<(), VoteRepositoryError>;
}
