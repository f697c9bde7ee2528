// App state for Axum server
use std::sync::Arc;

use votes_service::VoteService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<VoteService>,
}
