//! Vote service implementation.
//!
//! This module provides the orchestrator that records a user's vote on a post
//! and keeps the post's `points` equal to the sum of its ledger entries.
//!
//! # Transaction shape
//!
//! Every mutating operation runs the same sequence inside one `VoteTransaction`:
//!
//! 1. lock the post row and read its points (`NotFound` for unknown posts)
//! 2. read the caller's ledger entry for the post
//! 3. decide the `VoteTransition` from the current state
//! 4. write the ledger and adjust the aggregate by the transition's delta
//! 5. commit
//!
//! Any failure drops the transaction, which rolls it back, so a ledger write
//! without the matching aggregate change is never observable.
//!
//! # Repeated requests
//!
//! Voting the direction already recorded is a no-op returning the current
//! points. Removing a vote goes through `retract_vote`, which is a no-op when
//! there is nothing to retract. Replaying any request therefore converges to
//! the same end state.
use std::sync::Arc;

use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, instrument, warn};
use votes_repository::VoteStore;
use votes_shared::types::{
    LedgerAction, PostId, UserId, Vote, VoteDirection, VoteState, VoteTransition,
};

use crate::config::VoteServiceConfig;
use crate::errors::VoteError;
use crate::identity::RequestContext;

/// The orchestrator for vote requests.
///
/// The only component that writes the vote ledger or `Post.points`. Storage is
/// an explicit dependency passed in at construction.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use votes_repository::MemoryVoteStore;
/// use votes_service::{RequestContext, VoteService};
/// use votes_shared::types::{PostId, UserId};
///
/// # async fn example() -> Result<(), votes_service::VoteError> {
/// let service = VoteService::new(Arc::new(MemoryVoteStore::new()));
/// let ctx = RequestContext::authenticated(UserId(1));
/// let points = service.apply_vote(&ctx, PostId(1), 1).await?;
/// # Ok(())
/// # }
/// ```
pub struct VoteService {
    store: Arc<dyn VoteStore>,
    config: VoteServiceConfig,
}

impl VoteService {
    /// Create a new VoteService with default configuration.
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self {
            store,
            config: VoteServiceConfig::default(),
        }
    }

    /// Create a new VoteService with custom configuration.
    pub fn with_config(store: Arc<dyn VoteStore>, config: VoteServiceConfig) -> Self {
        Self { store, config }
    }

    /// Record the caller's vote on a post.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Request context carrying the caller identity
    /// * `post_id` - The post being voted on
    /// * `value` - `1` for an upvote, `-1` for a downvote
    ///
    /// # Returns
    ///
    /// * `Ok(i32)` - The post's points after the vote
    /// * `Err(VoteError::Unauthenticated)` - No caller identity
    /// * `Err(VoteError::InvalidArgument)` - `value` is not `1` or `-1`
    /// * `Err(VoteError::NotFound)` - The post does not exist
    /// * `Err(VoteError::Conflict)` - Lost a race more often than the retry budget allows
    /// * `Err(VoteError::StorageFailure)` - The transaction could not commit
    #[instrument(skip_all, fields(post_id = %post_id, value = value))]
    pub async fn apply_vote(
        &self,
        ctx: &RequestContext,
        post_id: PostId,
        value: i32,
    ) -> Result<i32, VoteError> {
        let user_id = ctx.require_user()?;
        let direction = VoteDirection::try_from(value)?;

        let points = self
            .with_conflict_retry(user_id, post_id, move |state| {
                VoteTransition::for_vote(state, direction)
            })
            .await?;

        info!(user_id = %user_id, post_id = %post_id, direction = ?direction, points, "Vote applied");
        Ok(points)
    }

    /// Remove the caller's vote on a post.
    ///
    /// # Returns
    ///
    /// * `Ok(i32)` - The post's points after the retraction (unchanged if there was no vote)
    /// * `Err(VoteError)` - Same classification as `apply_vote`
    #[instrument(skip_all, fields(post_id = %post_id))]
    pub async fn retract_vote(&self, ctx: &RequestContext, post_id: PostId) -> Result<i32, VoteError> {
        let user_id = ctx.require_user()?;

        let points = self
            .with_conflict_retry(user_id, post_id, VoteTransition::for_retraction)
            .await?;

        info!(user_id = %user_id, post_id = %post_id, points, "Vote retracted");
        Ok(points)
    }

    /// The caller's current vote on a post, if any.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(VoteDirection))` - The recorded direction
    /// * `Ok(None)` - The caller has not voted on the post
    /// * `Err(VoteError::Unauthenticated)` - No caller identity
    /// * `Err(VoteError::NotFound)` - The post does not exist
    pub async fn vote_status(
        &self,
        ctx: &RequestContext,
        post_id: PostId,
    ) -> Result<Option<VoteDirection>, VoteError> {
        let user_id = ctx.require_user()?;
        self.ensure_post_exists(post_id).await?;

        let mut tx = self.store.begin().await?;
        let vote = tx.get_vote(user_id, post_id).await?;
        tx.commit().await?;
        Ok(vote.map(|v| v.direction))
    }

    /// A post's current points. Anonymous callers may read it.
    pub async fn points(&self, post_id: PostId) -> Result<i32, VoteError> {
        self.store
            .find_post(post_id)
            .await?
            .map(|post| post.points)
            .ok_or_else(|| VoteError::NotFound(format!("post {}", post_id)))
    }

    async fn ensure_post_exists(&self, post_id: PostId) -> Result<(), VoteError> {
        self.points(post_id).await.map(|_| ())
    }

    /// Runs the vote transaction, replaying it with backoff while it fails
    /// with `Conflict` and the retry budget lasts.
    async fn with_conflict_retry<F>(
        &self,
        user_id: UserId,
        post_id: PostId,
        decide: F,
    ) -> Result<i32, VoteError>
    where
        F: Fn(VoteState) -> VoteTransition + Copy,
    {
        let strategy = ExponentialBackoff::from_millis(self.config.retry_base_delay_ms)
            .factor(2)
            .max_delay(self.config.retry_max_delay)
            .map(jitter)
            .take(self.config.max_conflict_retries);

        RetryIf::spawn(
            strategy,
            || self.execute(user_id, post_id, decide),
            |e: &VoteError| {
                let retry = e.is_retryable();
                if retry {
                    warn!(user_id = %user_id, post_id = %post_id, error = %e, "Vote transaction conflicted, retrying");
                }
                retry
            },
        )
        .await
    }

    /// One attempt of the read-decide-write sequence.
    async fn execute<F>(&self, user_id: UserId, post_id: PostId, decide: F) -> Result<i32, VoteError>
    where
        F: Fn(VoteState) -> VoteTransition,
    {
        let mut tx = self.store.begin().await?;

        let points = tx.lock_post(post_id).await?;
        let current = tx.get_vote(user_id, post_id).await?;
        let transition = decide(VoteState::from(current.as_ref()));

        debug!(
            user_id = %user_id,
            post_id = %post_id,
            current = ?current.map(|v| v.direction),
            action = ?transition.action,
            delta = transition.delta,
            "Vote transition decided"
        );

        match transition.action {
            LedgerAction::Keep => {
                tx.commit().await?;
                return Ok(points);
            }
            LedgerAction::Insert(direction) => {
                tx.insert_vote(&Vote::new(user_id, post_id, direction)).await?
            }
            LedgerAction::Update(direction) => tx.update_vote(user_id, post_id, direction).await?,
            LedgerAction::Remove => tx.remove_vote(user_id, post_id).await?,
        }

        let points = tx.adjust_points(post_id, transition.delta).await?;
        tx.commit().await?;
        Ok(points)
    }
}
