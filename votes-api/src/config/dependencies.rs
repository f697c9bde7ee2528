use std::sync::Arc;

use tracing::info;
use votes_repository::PostgresVoteStore;
use votes_service::{VoteService, VoteServiceConfig};

use crate::config::Settings;
use crate::errors::ApiError;

/// `Dependencies` holds the components the HTTP server is built from.
pub struct Dependencies {
    pub service: Arc<VoteService>,
}

impl Dependencies {
    /// Creates a new `Dependencies` instance.
    ///
    /// Connects the PostgreSQL pool, applies migrations when enabled, and wires
    /// the vote service on top of the store.
    ///
    /// # Returns
    ///
    /// A `Result` which is `Ok(Self)` on successful initialization or an
    /// `ApiError` if any dependency fails to initialize.
    pub async fn new(settings: &Settings) -> Result<Self, ApiError> {
        info!(
            max_connections = settings.max_connections,
            conflict_retries = settings.conflict_retries,
            run_migrations = settings.run_migrations,
            "Initializing dependencies"
        );

        let store = PostgresVoteStore::connect(&settings.database_url, settings.max_connections).await?;
        if settings.run_migrations {
            store.run_migrations().await?;
        }

        let config = VoteServiceConfig::with_max_conflict_retries(settings.conflict_retries);
        let service = VoteService::with_config(Arc::new(store), config);

        Ok(Dependencies {
            service: Arc::new(service),
        })
    }
}
