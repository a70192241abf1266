//! API error taxonomy
//!
//! Handlers return `ApiError`; the conversion to a response picks the HTTP
//! status and a stable machine-readable code. Cursor and page-size problems
//! are client mistakes, answered with 400 and a code the client can branch on
//! (the documented recovery for a bad cursor is to retry without one).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::pagination::{CursorError, PageError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidCursor(#[source] CursorError),
    #[error("{0}")]
    InvalidPageSize(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidCursor(_) => "INVALID_CURSOR",
            ApiError::InvalidPageSize(_) => "INVALID_PAGE_SIZE",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCursor(_)
            | ApiError::InvalidPageSize(_)
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref source) = self {
            tracing::error!(error = %source, "Request failed");
        }

        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<PageError> for ApiError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::Cursor(e) => ApiError::InvalidCursor(e),
            PageError::InvalidSize { .. } => ApiError::InvalidPageSize(err.to_string()),
            PageError::Db(e) => ApiError::Internal(e.into()),
            PageError::Other(e) => ApiError::Internal(e),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}
