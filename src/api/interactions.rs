//! Follow and comment endpoints

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::db::CreateComment;
use crate::db::users::FollowOutcome;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FollowRequest {
    follower_id: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FollowResponse {
    followed: bool,
    already_following: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentRequest {
    user_id: i64,
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentResponse {
    id: i64,
}

/// Follow the user named in the path
async fn follow(
    State(state): State<AppState>,
    Path(followee_id): Path<i64>,
    Json(request): Json<FollowRequest>,
) -> Result<Json<FollowResponse>, ApiError> {
    if request.follower_id == followee_id {
        return Err(ApiError::BadRequest(
            "users cannot follow themselves".to_string(),
        ));
    }
    if state.db.users().get_by_id(followee_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("user {followee_id}")));
    }

    let outcome = state
        .interactions
        .follow_user(request.follower_id, followee_id)
        .await?;

    Ok(Json(FollowResponse {
        followed: outcome == FollowOutcome::Followed,
        already_following: outcome == FollowOutcome::AlreadyFollowing,
    }))
}

/// Comment on the post named in the path
async fn comment(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    if request.content.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "comment content must not be empty".to_string(),
        ));
    }
    if state.db.posts().get_by_id(post_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("post {post_id}")));
    }

    let id = state
        .interactions
        .add_comment(CreateComment {
            post_id,
            user_id: request.user_id,
            content: request.content,
        })
        .await?;

    Ok(Json(CommentResponse { id }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{id}/follow", post(follow))
        .route("/posts/{id}/comments", post(comment))
}
