//! Page assembly
//!
//! List queries fetch `size + 1` rows; the extra row only proves that a further
//! page exists and is never returned. No COUNT query is issued anywhere on the
//! paging path.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pagination::cursor::{CursorError, CursorValue, decode_cursor, encode_cursor};
use crate::pagination::keyset::SortKey;

/// Default page size when the client omits `size` (matches the API default the
/// mobile clients were built against).
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Errors surfaced by the paging path. Cursor and size problems are client
/// errors; storage failures pass through untranslated for the request layer to
/// classify.
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Cursor(#[from] CursorError),
    #[error("page size {given} out of range, must be between 1 and {max}")]
    InvalidSize { given: i64, max: i64 },
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Incoming pagination parameters, deserialized straight from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageRequest {
    pub size: Option<i64>,
    pub cursor: Option<String>,
}

impl PageRequest {
    pub fn new(size: Option<i64>, cursor: Option<String>) -> Self {
        Self { size, cursor }
    }

    /// Validated page size: default when omitted, rejected when non-positive or
    /// above the configured maximum.
    pub fn validated_size(&self, max: i64) -> Result<i64, PageError> {
        match self.size {
            None => Ok(DEFAULT_PAGE_SIZE.min(max)),
            Some(given) if given < 1 || given > max => Err(PageError::InvalidSize { given, max }),
            Some(given) => Ok(given),
        }
    }

    /// Decode the cursor, if any, against the sort key it will drive.
    pub fn boundary(&self, key: &SortKey) -> Result<Option<Vec<CursorValue>>, CursorError> {
        match self.cursor.as_deref() {
            None | Some("") => Ok(None),
            Some(token) => decode_cursor(token, key).map(Some),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Assemble a page from up to `size + 1` rows fetched in result order.
    ///
    /// When the probe row is present it is dropped and the next cursor is taken
    /// from the last *retained* row's boundary values.
    pub fn from_rows(
        mut rows: Vec<T>,
        size: i64,
        key: &SortKey,
        boundary_of: impl Fn(&T) -> Vec<CursorValue>,
    ) -> Self {
        let size = size as usize;
        let has_next = rows.len() > size;
        rows.truncate(size);

        let next_cursor = if has_next {
            rows.last().map(|row| encode_cursor(&boundary_of(row), key))
        } else {
            None
        };

        Self {
            items: rows,
            next_cursor,
            has_next,
        }
    }

    /// Map the items while keeping the paging bookkeeping intact. Used by the
    /// two-phase hydration path, where children are attached after the paging
    /// math is already done.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            has_next: self.has_next,
        }
    }
}

/// Apply a cursor boundary and page limit to a list that is already sorted
/// under `key`.
///
/// This is the in-memory counterpart of the seek predicate, for endpoints that
/// merge several queries into one feed before paging. Items at or before the
/// boundary are dropped; at most `size + 1` items are kept so the result plugs
/// directly into [`Page::from_rows`].
pub fn apply_cursor_to_sorted<T>(
    items: Vec<T>,
    key: &SortKey,
    boundary: Option<&[CursorValue]>,
    size: i64,
    boundary_of: impl Fn(&T) -> Vec<CursorValue>,
) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| match boundary {
            None => true,
            Some(boundary) => {
                key.compare(&boundary_of(item), boundary) == std::cmp::Ordering::Greater
            }
        })
        .take(size as usize + 1)
        .collect()
}
