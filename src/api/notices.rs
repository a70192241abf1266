//! Notice endpoints

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::AppState;
use crate::db::NoticeRecord;
use crate::error::ApiError;
use crate::pagination::{Page, PageRequest};

/// List published notices, newest first
async fn list_notices(
    State(state): State<AppState>,
    Query(request): Query<PageRequest>,
) -> Result<Json<Page<NoticeRecord>>, ApiError> {
    let page = state
        .db
        .notices()
        .list_published(&request, state.config.max_page_size)
        .await?;

    Ok(Json(page))
}

/// Fetch one notice by id
async fn get_notice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NoticeRecord>, ApiError> {
    let notice = state
        .db
        .notices()
        .get_by_id(id)
        .await?
        .filter(|n| n.published)
        .ok_or_else(|| ApiError::NotFound(format!("notice {id}")))?;

    Ok(Json(notice))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notices", get(list_notices))
        .route("/notices/{id}", get(get_notice))
}
