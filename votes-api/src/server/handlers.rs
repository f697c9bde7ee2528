// HTTP request handlers
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};
use votes_service::VoteError;
use votes_shared::types::PostId;

use crate::server::identity::caller_context;
use crate::server::state::AppState;

/// Body of a vote request.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub value: i32,
}

type JsonResponse = (StatusCode, Json<Value>);

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Vote server is running")
}

/// Records the caller's vote on a post and returns the post's new points
pub async fn apply_vote(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    headers: HeaderMap,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> JsonResponse {
    let ctx = caller_context(&headers);
    let payload = match payload {
        Ok(Json(payload)) => payload,
        // The caller's identity is checked before the body, as in the service.
        Err(_) if ctx.user_id().is_none() => return error_response(VoteError::Unauthenticated),
        Err(rejection) => {
            return error_response(VoteError::InvalidArgument(format!(
                "vote value must be 1 or -1: {}",
                rejection.body_text()
            )));
        }
    };

    match state.service.apply_vote(&ctx, PostId(post_id), payload.value).await {
        Ok(points) => (StatusCode::OK, Json(json!({ "points": points }))),
        Err(e) => error_response(e),
    }
}

/// Removes the caller's vote on a post
pub async fn retract_vote(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    headers: HeaderMap,
) -> JsonResponse {
    let ctx = caller_context(&headers);
    match state.service.retract_vote(&ctx, PostId(post_id)).await {
        Ok(points) => (StatusCode::OK, Json(json!({ "points": points }))),
        Err(e) => error_response(e),
    }
}

/// The caller's current vote on a post, `null` when there is none
pub async fn vote_status(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    headers: HeaderMap,
) -> JsonResponse {
    let ctx = caller_context(&headers);
    match state.service.vote_status(&ctx, PostId(post_id)).await {
        Ok(direction) => (
            StatusCode::OK,
            Json(json!({ "vote": direction.map(|d| d.value()) })),
        ),
        Err(e) => error_response(e),
    }
}

/// A post's current points
pub async fn points(State(state): State<AppState>, Path(post_id): Path<i32>) -> JsonResponse {
    match state.service.points(PostId(post_id)).await {
        Ok(points) => (StatusCode::OK, Json(json!({ "points": points }))),
        Err(e) => error_response(e),
    }
}

fn status_for(err: &VoteError) -> StatusCode {
    match err {
        VoteError::Unauthenticated => StatusCode::UNAUTHORIZED,
        VoteError::NotFound(_) => StatusCode::NOT_FOUND,
        VoteError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        VoteError::Conflict(_) => StatusCode::CONFLICT,
        VoteError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: VoteError) -> JsonResponse {
    let status = status_for(&err);
    let message = match &err {
        VoteError::StorageFailure(detail) => {
            error!("Vote request failed: {}", detail);
            "Internal storage failure".to_string()
        }
        other => {
            warn!("Vote request rejected: {}", other);
            other.to_string()
        }
    };

    (
        status,
        Json(json!({
            "status": "error",
            "message": message
        })),
    )
}
