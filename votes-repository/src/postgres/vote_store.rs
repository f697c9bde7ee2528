//! PostgreSQL implementation of the vote store.
//!
//! Provides the production backend for the `VoteStore` trait with connection
//! pooling and transaction-scoped ledger access.
//!
//! ## Concurrency
//!
//! - `lock_post` takes the post row lock with `SELECT ... FOR UPDATE`, so every
//!   vote transaction on the same post runs one after the other
//! - `adjust_points` increments inside the `UPDATE` statement, never in Rust
//! - The `(user_id, post_id)` primary key rejects a second ledger entry with a
//!   unique violation, classified as `VoteRepositoryError::Conflict`
//!
//! ## Database Tables
//!
//! - `users`: Registered users with lowercase unique usernames
//! - `post`: Posts with the denormalized `points` aggregate
//! - `vote`: Ledger entries keyed by `(user_id, post_id)`
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};
use votes_shared::types::{NewPost, NewUser, Post, PostId, User, UserId, Vote, VoteDirection};

use crate::{VoteRepositoryError, VoteStore, VoteTransaction};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    password: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId(row.id),
            username: row.username,
            password_hash: row.password,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i32,
    creator_id: i32,
    title: String,
    text: String,
    points: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: PostId(row.id),
            creator_id: UserId(row.creator_id),
            title: row.title,
            text: row.text,
            points: row.points,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VoteRow {
    user_id: i32,
    post_id: i32,
    value: i32,
}

impl TryFrom<VoteRow> for Vote {
    type Error = VoteRepositoryError;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        let direction = VoteDirection::try_from(row.value)
            .map_err(|e| VoteRepositoryError::InvalidVoteValue(e.0))?;
        Ok(Vote::new(UserId(row.user_id), PostId(row.post_id), direction))
    }
}

/// PostgreSQL implementation of the vote store.
///
/// Hands out `PostgresVoteTransaction`s backed by pooled connections.
pub struct PostgresVoteStore {
    pool: sqlx::PgPool,
}

impl PostgresVoteStore {
    /// Creates a new PostgreSQL vote store from an existing pool.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool with required schema
    pub async fn new(pool: sqlx::PgPool) -> Result<Self, VoteRepositoryError> {
        Ok(Self { pool })
    }

    /// Connects a new pool to `database_url` and wraps it in a store.
    ///
    /// # Arguments
    ///
    /// * `database_url` - PostgreSQL connection string
    /// * `max_connections` - Upper bound of pooled connections
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, VoteRepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(VoteRepositoryError::DatabaseError)?;
        Self::new(pool).await
    }

    /// Applies the bundled schema migrations.
    pub async fn run_migrations(&self) -> Result<(), VoteRepositoryError> {
        sqlx::migrate!("./src/postgres/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| VoteRepositoryError::DatabaseError(e.into()))?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

#[async_trait]
impl VoteStore for PostgresVoteStore {
    async fn begin(&self) -> Result<Box<dyn VoteTransaction>, VoteRepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresVoteTransaction { tx }))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, VoteRepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password)
            VALUES ($1, $2)
            RETURNING id, username, password, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, VoteRepositoryError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO post (creator_id, title, text)
            VALUES ($1, $2, $3)
            RETURNING id, creator_id, title, text, points, created_at, updated_at
            "#,
        )
        .bind(post.creator_id.0)
        .bind(&post.title)
        .bind(&post.text)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_post(&self, post_id: PostId) -> Result<Option<Post>, VoteRepositoryError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, creator_id, title, text, points, created_at, updated_at
            FROM post
            WHERE id = $1
            "#,
        )
        .bind(post_id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Post::from))
    }

    async fn list_votes(&self, post_id: PostId) -> Result<Vec<Vote>, VoteRepositoryError> {
        let rows = sqlx::query_as::<_, VoteRow>(
            "SELECT user_id, post_id, value FROM vote WHERE post_id = $1 ORDER BY user_id",
        )
        .bind(post_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Vote::try_from).collect()
    }
}

/// A vote transaction on a pooled PostgreSQL connection.
///
/// Dropping it without calling `commit` rolls the transaction back.
pub struct PostgresVoteTransaction {
    tx: sqlx::Transaction<'static, sqlx::Postgres>,
}

#[async_trait]
impl VoteTransaction for PostgresVoteTransaction {
    async fn lock_post(&mut self, post_id: PostId) -> Result<i32, VoteRepositoryError> {
        let points = sqlx::query_scalar::<_, i32>("SELECT points FROM post WHERE id = $1 FOR UPDATE")
            .bind(post_id.0)
            .fetch_optional(&mut *self.tx)
            .await?;

        points.ok_or_else(|| VoteRepositoryError::not_found(format!("post {}", post_id)))
    }

    async fn adjust_points(&mut self, post_id: PostId, delta: i32) -> Result<i32, VoteRepositoryError> {
        let points = sqlx::query_scalar::<_, i32>(
            "UPDATE post SET points = points + $2 WHERE id = $1 RETURNING points",
        )
        .bind(post_id.0)
        .bind(delta)
        .fetch_optional(&mut *self.tx)
        .await?;

        let points = points.ok_or_else(|| VoteRepositoryError::not_found(format!("post {}", post_id)))?;
        debug!(post_id = %post_id, delta, points, "Adjusted post points");
        Ok(points)
    }

    async fn get_vote(
        &mut self,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<Option<Vote>, VoteRepositoryError> {
        let row = sqlx::query_as::<_, VoteRow>(
            "SELECT user_id, post_id, value FROM vote WHERE user_id = $1 AND post_id = $2",
        )
        .bind(user_id.0)
        .bind(post_id.0)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Vote::try_from).transpose()
    }

    async fn insert_vote(&mut self, vote: &Vote) -> Result<(), VoteRepositoryError> {
        sqlx::query("INSERT INTO vote (user_id, post_id, value) VALUES ($1, $2, $3)")
            .bind(vote.user_id.0)
            .bind(vote.post_id.0)
            .bind(vote.value())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update_vote(
        &mut self,
        user_id: UserId,
        post_id: PostId,
        direction: VoteDirection,
    ) -> Result<(), VoteRepositoryError> {
        let result = sqlx::query("UPDATE vote SET value = $3 WHERE user_id = $1 AND post_id = $2")
            .bind(user_id.0)
            .bind(post_id.0)
            .bind(direction.value())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(VoteRepositoryError::not_found(format!(
                "vote of user {} on post {}",
                user_id, post_id
            )));
        }
        Ok(())
    }

    async fn remove_vote(&mut self, user_id: UserId, post_id: PostId) -> Result<(), VoteRepositoryError> {
        let result = sqlx::query("DELETE FROM vote WHERE user_id = $1 AND post_id = $2")
            .bind(user_id.0)
            .bind(post_id.0)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(VoteRepositoryError::not_found(format!(
                "vote of user {} on post {}",
                user_id, post_id
            )));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), VoteRepositoryError> {
        self.tx.commit().await.map_err(VoteRepositoryError::from)
    }
}
