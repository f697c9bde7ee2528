//! Integration tests for the PostgreSQL vote store.
//!
//! These tests require a real PostgreSQL database and use SQLx test macros
//! to ensure proper test isolation and cleanup.
//!
//! Run with: `cargo test --test postgres_integration`

use std::sync::Arc;

use votes_repository::{PostgresVoteStore, VoteRepositoryError, VoteStore};
use votes_shared::types::{NewPost, NewUser, Post, PostId, User, UserId, Vote, VoteDirection};

/// Creates a user with the given name.
async fn make_user(store: &PostgresVoteStore, name: &str) -> User {
    store.create_user(&NewUser::new(name, "argon2-hash")).await.unwrap()
}

/// Creates a post owned by `creator`.
async fn make_post(store: &PostgresVoteStore, creator: &User) -> Post {
    store
        .create_post(&NewPost {
            creator_id: creator.id,
            title: "Spirited Away".to_string(),
            text: "A young girl wanders into a world ruled by gods and witches.".to_string(),
        })
        .await
        .unwrap()
}

async fn points_of(store: &PostgresVoteStore, post_id: PostId) -> i32 {
    store.find_post(post_id).await.unwrap().unwrap().points
}

// ============================================================================
// Collaborator Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_create_user_and_post(pool: sqlx::PgPool) {
    let store = PostgresVoteStore::new(pool.clone()).await.unwrap();

    let user = make_user(&store, "Alice").await;
    assert_eq!(user.username, "alice");

    let post = make_post(&store, &user).await;
    assert_eq!(post.creator_id, user.id);
    assert_eq!(post.points, 0);

    let found = store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(found.title, post.title);
    assert!(store.find_post(PostId(post.id.0 + 1000)).await.unwrap().is_none());
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_duplicate_username_is_conflict(pool: sqlx::PgPool) {
    let store = PostgresVoteStore::new(pool.clone()).await.unwrap();
    make_user(&store, "alice").await;

    let result = store.create_user(&NewUser::new("ALICE", "other")).await;
    assert!(matches!(result, Err(VoteRepositoryError::Conflict(_))));
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_post_with_unknown_creator_is_not_found(pool: sqlx::PgPool) {
    let store = PostgresVoteStore::new(pool.clone()).await.unwrap();
    let result = store
        .create_post(&NewPost {
            creator_id: UserId(404),
            title: "orphan".to_string(),
            text: "orphan".to_string(),
        })
        .await;
    assert!(matches!(result, Err(VoteRepositoryError::NotFound(_))));
}

// ============================================================================
// Ledger Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_vote_lifecycle(pool: sqlx::PgPool) {
    let store = PostgresVoteStore::new(pool.clone()).await.unwrap();
    let user = make_user(&store, "alice").await;
    let post = make_post(&store, &user).await;

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.lock_post(post.id).await.unwrap(), 0);
    assert!(tx.get_vote(user.id, post.id).await.unwrap().is_none());
    tx.insert_vote(&Vote::new(user.id, post.id, VoteDirection::Up)).await.unwrap();
    assert_eq!(tx.adjust_points(post.id, 1).await.unwrap(), 1);
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    tx.update_vote(user.id, post.id, VoteDirection::Down).await.unwrap();
    assert_eq!(tx.adjust_points(post.id, -2).await.unwrap(), -1);
    assert_eq!(
        tx.get_vote(user.id, post.id).await.unwrap(),
        Some(Vote::new(user.id, post.id, VoteDirection::Down))
    );
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    tx.remove_vote(user.id, post.id).await.unwrap();
    assert_eq!(tx.adjust_points(post.id, 1).await.unwrap(), 0);
    tx.commit().await.unwrap();

    assert_eq!(points_of(&store, post.id).await, 0);
    assert!(store.list_votes(post.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_uncommitted_transaction_rolls_back(pool: sqlx::PgPool) {
    let store = PostgresVoteStore::new(pool.clone()).await.unwrap();
    let user = make_user(&store, "alice").await;
    let post = make_post(&store, &user).await;

    {
        let mut tx = store.begin().await.unwrap();
        tx.lock_post(post.id).await.unwrap();
        tx.insert_vote(&Vote::new(user.id, post.id, VoteDirection::Up)).await.unwrap();
        tx.adjust_points(post.id, 1).await.unwrap();
    }

    assert_eq!(points_of(&store, post.id).await, 0);
    assert!(store.list_votes(post.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_duplicate_vote_is_conflict(pool: sqlx::PgPool) {
    let store = PostgresVoteStore::new(pool.clone()).await.unwrap();
    let user = make_user(&store, "alice").await;
    let post = make_post(&store, &user).await;
    let vote = Vote::new(user.id, post.id, VoteDirection::Up);

    let mut tx = store.begin().await.unwrap();
    tx.insert_vote(&vote).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let result = tx.insert_vote(&vote).await;
    match result {
        Err(VoteRepositoryError::Conflict(msg)) => assert_eq!(msg, "vote already exists"),
        other => panic!("Expected Conflict, got {:?}", other),
    }
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_missing_rows_are_not_found(pool: sqlx::PgPool) {
    let store = PostgresVoteStore::new(pool.clone()).await.unwrap();
    let user = make_user(&store, "alice").await;
    let post = make_post(&store, &user).await;
    let missing_post = PostId(post.id.0 + 1000);

    let mut tx = store.begin().await.unwrap();
    assert!(matches!(tx.lock_post(missing_post).await, Err(VoteRepositoryError::NotFound(_))));
    assert!(matches!(
        tx.adjust_points(missing_post, 1).await,
        Err(VoteRepositoryError::NotFound(_))
    ));
    assert!(matches!(
        tx.update_vote(user.id, post.id, VoteDirection::Up).await,
        Err(VoteRepositoryError::NotFound(_))
    ));
    assert!(matches!(
        tx.remove_vote(user.id, post.id).await,
        Err(VoteRepositoryError::NotFound(_))
    ));
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_vote_on_unknown_post_is_not_found(pool: sqlx::PgPool) {
    let store = PostgresVoteStore::new(pool.clone()).await.unwrap();
    let user = make_user(&store, "alice").await;

    let mut tx = store.begin().await.unwrap();
    let result = tx.insert_vote(&Vote::new(user.id, PostId(404), VoteDirection::Up)).await;
    match result {
        Err(VoteRepositoryError::NotFound(msg)) => assert_eq!(msg, "unknown post"),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_vote_by_unknown_user_hides_driver_text(pool: sqlx::PgPool) {
    let store = PostgresVoteStore::new(pool.clone()).await.unwrap();
    let user = make_user(&store, "alice").await;
    let post = make_post(&store, &user).await;

    let mut tx = store.begin().await.unwrap();
    let result = tx.insert_vote(&Vote::new(UserId(user.id.0 + 1000), post.id, VoteDirection::Up)).await;
    match result {
        Err(VoteRepositoryError::NotFound(msg)) => {
            assert_eq!(msg, "unknown user");
            assert!(!msg.contains("vote_user_id_fkey"));
            assert!(!msg.contains("violates"));
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_check_constraint_rejects_zero_value(pool: sqlx::PgPool) {
    let store = PostgresVoteStore::new(pool.clone()).await.unwrap();
    let user = make_user(&store, "alice").await;
    let post = make_post(&store, &user).await;

    let err = sqlx::query("INSERT INTO vote (user_id, post_id, value) VALUES ($1, $2, 0)")
        .bind(user.id.0)
        .bind(post.id.0)
        .execute(&pool)
        .await
        .unwrap_err();

    assert!(matches!(
        VoteRepositoryError::from(err),
        VoteRepositoryError::ConstraintViolation(_)
    ));
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_concurrent_adjustments_are_not_lost(pool: sqlx::PgPool) {
    let store = Arc::new(PostgresVoteStore::new(pool.clone()).await.unwrap());
    let author = make_user(&store, "author").await;
    let post = make_post(&store, &author).await;

    let mut voters = Vec::new();
    for i in 0..8 {
        voters.push(make_user(&store, &format!("voter{}", i)).await);
    }

    let handles = voters.iter().enumerate().map(|(i, voter)| {
        let store = store.clone();
        let direction = if i % 3 == 0 { VoteDirection::Down } else { VoteDirection::Up };
        let vote = Vote::new(voter.id, post.id, direction);
        tokio::spawn(async move {
            let mut tx = store.begin().await?;
            tx.lock_post(vote.post_id).await?;
            tx.insert_vote(&vote).await?;
            tx.adjust_points(vote.post_id, vote.value()).await?;
            tx.commit().await
        })
    });

    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    let ledger_sum: i32 = store.list_votes(post.id).await.unwrap().iter().map(Vote::value).sum();
    // three downvotes (0, 3, 6) and five upvotes
    assert_eq!(ledger_sum, 2);
    assert_eq!(points_of(&store, post.id).await, ledger_sum);
}
