//! Seek-based pagination engine
//!
//! Every list endpoint pages with an opaque cursor over a tie-broken sort key
//! instead of a row offset. The engine has three parts:
//! - `cursor`: encodes/decodes the boundary of the last-seen row as an opaque,
//!   integrity-tagged token
//! - `keyset`: builds the `WHERE`/`ORDER BY` fragments that resume a scan
//!   strictly after that boundary (the "seek method")
//! - `page`: executes with `limit = size + 1`, trims the probe row, and packages
//!   the result with `hasNext` and the next cursor
//!
//! Offset pagination is deliberately not offered: it re-scans skipped rows and
//! drifts under concurrent inserts/deletes. A record inserted after a cursor was
//! issued may or may not appear in the next page; the only ordering contract is
//! the snapshot of each individual query.

pub mod cursor;
pub mod keyset;
pub mod page;

pub use cursor::{CursorError, CursorValue, decode_cursor, encode_cursor};
pub use keyset::{FieldKind, SortDirection, SortField, SortKey};
pub use page::{Page, PageError, PageRequest, apply_cursor_to_sorted};
