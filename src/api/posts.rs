//! Post feed endpoints
//!
//! All feeds share the same query parameters: `size` and `cursor`. The
//! curation feed additionally takes `era` and `continent`, and the user feed
//! takes `status`.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::AppState;
use crate::db::{Continent, CurationPostItem, Era, PostRecord, PostStatus};
use crate::error::ApiError;
use crate::pagination::{Page, PageRequest};

// Pagination params are spelled out rather than flattened: serde_urlencoded
// cannot drive numeric fields through #[serde(flatten)].
#[derive(Debug, Deserialize)]
struct CurationQuery {
    era: Option<String>,
    continent: Option<String>,
    size: Option<i64>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserPostsQuery {
    status: Option<String>,
    size: Option<i64>,
    cursor: Option<String>,
}

/// Public free-board feed
async fn list_free(
    State(state): State<AppState>,
    Query(request): Query<PageRequest>,
) -> Result<Json<Page<PostRecord>>, ApiError> {
    let page = state
        .db
        .posts()
        .list_free(&request, state.config.max_page_size)
        .await?;

    Ok(Json(page))
}

/// Public story feed
async fn list_story(
    State(state): State<AppState>,
    Query(request): Query<PageRequest>,
) -> Result<Json<Page<PostRecord>>, ApiError> {
    let page = state
        .db
        .posts()
        .list_story(&request, state.config.max_page_size)
        .await?;

    Ok(Json(page))
}

/// Public curation feed with composers attached
async fn list_curation(
    State(state): State<AppState>,
    Query(query): Query<CurationQuery>,
) -> Result<Json<Page<CurationPostItem>>, ApiError> {
    let era = query
        .era
        .as_deref()
        .map(|s| Era::from_str(s).ok_or_else(|| ApiError::BadRequest(format!("unknown era {s}"))))
        .transpose()?;
    let continent = query
        .continent
        .as_deref()
        .map(|s| {
            Continent::from_str(s)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown continent {s}")))
        })
        .transpose()?;

    let request = PageRequest::new(query.size, query.cursor);
    let page = state
        .db
        .posts()
        .list_curation(era, continent, &request, state.config.max_page_size)
        .await?;

    Ok(Json(page))
}

/// A user's own posts, drafts included
async fn list_user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<UserPostsQuery>,
) -> Result<Json<Page<PostRecord>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            PostStatus::from_str(s)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown post status {s}")))
        })
        .transpose()?;

    let request = PageRequest::new(query.size, query.cursor);
    let page = state
        .db
        .posts()
        .list_by_user(user_id, status, &request, state.config.max_page_size)
        .await?;

    Ok(Json(page))
}

/// Public posts mentioning a composer, merged across story and curation
async fn list_composer_posts(
    State(state): State<AppState>,
    Path(composer_id): Path<i64>,
    Query(request): Query<PageRequest>,
) -> Result<Json<Page<PostRecord>>, ApiError> {
    if state.db.composers().get_by_id(composer_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("composer {composer_id}")));
    }

    let page = state
        .db
        .posts()
        .list_by_composer(composer_id, &request, state.config.max_page_size)
        .await?;

    Ok(Json(page))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/free", get(list_free))
        .route("/posts/story", get(list_story))
        .route("/posts/curation", get(list_curation))
        .route("/users/{id}/posts", get(list_user_posts))
        .route("/composers/{id}/posts", get(list_composer_posts))
}
