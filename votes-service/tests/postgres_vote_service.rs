//! Vote service tests over the PostgreSQL store.
//!
//! Concurrent requests here really interleave on separate connections, unlike
//! the in-memory store, which serializes whole transactions.
//!
//! Run with: `cargo test --test postgres_vote_service`

use std::sync::Arc;

use futures::future::join_all;
use votes_repository::{PostgresVoteStore, VoteStore};
use votes_service::{RequestContext, VoteError, VoteService, VoteServiceConfig};
use votes_shared::types::{NewPost, NewUser, Post, User, UserId, Vote};

struct PgFixture {
    store: Arc<PostgresVoteStore>,
    service: Arc<VoteService>,
    post: Post,
}

impl PgFixture {
    async fn new(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(PostgresVoteStore::new(pool).await.unwrap());
        let author = store.create_user(&NewUser::new("author", "hash")).await.unwrap();
        let post = store
            .create_post(&NewPost {
                creator_id: author.id,
                title: "Paprika".to_string(),
                text: "A device lets therapists enter their patients' dreams.".to_string(),
            })
            .await
            .unwrap();
        let service = Arc::new(VoteService::with_config(
            store.clone(),
            VoteServiceConfig::with_max_conflict_retries(5),
        ));
        Self { store, service, post }
    }

    async fn user(&self, name: &str) -> User {
        self.store.create_user(&NewUser::new(name, "hash")).await.unwrap()
    }

    async fn points(&self) -> i32 {
        self.store.find_post(self.post.id).await.unwrap().unwrap().points
    }

    async fn ledger(&self) -> Vec<Vote> {
        self.store.list_votes(self.post.id).await.unwrap()
    }
}

#[sqlx::test(migrations = "../votes-repository/src/postgres/migrations")]
async fn test_concurrent_distinct_voters(pool: sqlx::PgPool) {
    let f = PgFixture::new(pool).await;

    let mut users = Vec::new();
    for i in 0..12 {
        users.push(f.user(&format!("voter{}", i)).await);
    }

    let handles = users.iter().enumerate().map(|(i, user)| {
        let service = f.service.clone();
        let ctx = RequestContext::authenticated(user.id);
        let post_id = f.post.id;
        let value = if i % 3 == 0 { -1 } else { 1 };
        tokio::spawn(async move { service.apply_vote(&ctx, post_id, value).await })
    });

    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }

    let ledger = f.ledger().await;
    assert_eq!(ledger.len(), 12);
    let sum: i32 = ledger.iter().map(Vote::value).sum();
    // 4 downvotes, 8 upvotes
    assert_eq!(sum, 4);
    assert_eq!(f.points().await, sum);
}

#[sqlx::test(migrations = "../votes-repository/src/postgres/migrations")]
async fn test_concurrent_double_submit(pool: sqlx::PgPool) {
    let f = PgFixture::new(pool).await;
    let user = f.user("alice").await;

    let handles = (0..16).map(|_| {
        let service = f.service.clone();
        let ctx = RequestContext::authenticated(user.id);
        let post_id = f.post.id;
        tokio::spawn(async move { service.apply_vote(&ctx, post_id, 1).await })
    });

    for result in join_all(handles).await {
        assert_eq!(result.unwrap(), Ok(1));
    }

    let ledger = f.ledger().await;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].user_id, user.id);
    assert_eq!(f.points().await, 1);
}

#[sqlx::test(migrations = "../votes-repository/src/postgres/migrations")]
async fn test_concurrent_switches_and_retractions(pool: sqlx::PgPool) {
    let f = PgFixture::new(pool).await;
    let mut users = Vec::new();
    for i in 0..6 {
        users.push(f.user(&format!("user{}", i)).await);
    }

    let mut handles = Vec::new();
    for round in 0..4 {
        for (i, user) in users.iter().enumerate() {
            let service = f.service.clone();
            let ctx = RequestContext::authenticated(user.id);
            let post_id = f.post.id;
            let step = (round + i) % 3;
            handles.push(tokio::spawn(async move {
                match step {
                    0 => service.apply_vote(&ctx, post_id, 1).await,
                    1 => service.apply_vote(&ctx, post_id, -1).await,
                    _ => service.retract_vote(&ctx, post_id).await,
                }
            }));
        }
    }

    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }

    let ledger = f.ledger().await;
    assert!(ledger.len() <= users.len());
    let sum: i32 = ledger.iter().map(Vote::value).sum();
    assert_eq!(f.points().await, sum);
}

#[sqlx::test(migrations = "../votes-repository/src/postgres/migrations")]
async fn test_unknown_user_message_hides_driver_text(pool: sqlx::PgPool) {
    let f = PgFixture::new(pool).await;
    let ghost = RequestContext::authenticated(UserId(9999));

    match f.service.apply_vote(&ghost, f.post.id, 1).await {
        Err(VoteError::NotFound(msg)) => {
            assert_eq!(msg, "unknown user");
            assert!(!msg.contains("fkey"));
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
    assert_eq!(f.points().await, 0);
    assert!(f.ledger().await.is_empty());
}
