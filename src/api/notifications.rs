//! Notification feed endpoints
//!
//! The receiver is named explicitly in the query string; request
//! authentication is handled upstream of this service.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::db::NotificationFeedItem;
use crate::error::ApiError;
use crate::pagination::{Page, PageRequest};

// Pagination params are spelled out rather than flattened: serde_urlencoded
// cannot drive numeric fields through #[serde(flatten)].
#[derive(Debug, Deserialize)]
struct FeedQuery {
    receiver_id: i64,
    size: Option<i64>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReceiverQuery {
    receiver_id: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UnreadCountResponse {
    unread_count: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkReadResponse {
    updated: bool,
}

/// A receiver's notification feed, limited to the retention window
async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Page<NotificationFeedItem>>, ApiError> {
    let request = PageRequest::new(query.size, query.cursor);
    let page = state
        .db
        .notifications()
        .list_recent(
            query.receiver_id,
            state.config.notification_window_days,
            &request,
            state.config.max_page_size,
        )
        .await?;

    Ok(Json(page))
}

/// Unread count within the retention window
async fn unread_count(
    State(state): State<AppState>,
    Query(query): Query<ReceiverQuery>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let unread_count = state
        .db
        .notifications()
        .unread_count(query.receiver_id, state.config.notification_window_days)
        .await?;

    Ok(Json(UnreadCountResponse { unread_count }))
}

/// Mark one notification as read
async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ReceiverQuery>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let updated = state
        .db
        .notifications()
        .mark_as_read(id, query.receiver_id)
        .await?;

    Ok(Json(MarkReadResponse { updated }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/{id}/read", post(mark_read))
}
