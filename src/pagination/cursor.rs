//! Opaque cursor codec
//!
//! A cursor carries the sort-key values of the last row a client has seen, plus
//! a fingerprint of the sort specification it was minted under and a CRC32
//! integrity tag. All state needed to resume a scan lives in the token itself;
//! nothing is persisted server-side.
//!
//! Token layout: `base64url(json payload) "." crc32-in-hex`, where the payload
//! is `{"s": <shape fingerprint>, "v": [<values>]}`.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

use crate::db::list_query::SqlValue;
use crate::db::sqlite_helpers::datetime_to_str;
use crate::pagination::keyset::SortKey;

/// A single boundary value of the sort-key tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CursorValue {
    #[serde(rename = "i")]
    Int(i64),
    #[serde(rename = "t")]
    Text(String),
    #[serde(rename = "z")]
    Timestamp(DateTime<Utc>),
}

impl CursorValue {
    /// Bindable SQL representation. Timestamps use the same fixed-width RFC3339
    /// text the schema stores, so TEXT comparison in the seek predicate matches
    /// chronological order.
    pub fn to_sql_value(&self) -> SqlValue {
        match self {
            CursorValue::Int(i) => SqlValue::Int(*i),
            CursorValue::Text(s) => SqlValue::Text(s.clone()),
            CursorValue::Timestamp(ts) => SqlValue::Text(datetime_to_str(*ts)),
        }
    }

    /// Total order between values of the same kind. Cursors are kind-checked on
    /// decode, so mismatched variants cannot reach comparisons through the
    /// public API; they compare equal rather than panic.
    pub(crate) fn cmp_same_kind(&self, other: &CursorValue) -> Ordering {
        match (self, other) {
            (CursorValue::Int(a), CursorValue::Int(b)) => a.cmp(b),
            (CursorValue::Text(a), CursorValue::Text(b)) => a.cmp(b),
            (CursorValue::Timestamp(a), CursorValue::Timestamp(b)) => a.cmp(b),
            _ => {
                debug_assert!(false, "cursor value kind mismatch");
                Ordering::Equal
            }
        }
    }
}

/// Why a cursor was rejected. All variants are client errors; the recommended
/// recovery is to drop the cursor and restart from the first page.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("cursor token is not parseable")]
    Malformed,
    #[error("cursor does not match the requested sort specification")]
    ShapeMismatch,
    #[error("cursor integrity tag does not verify")]
    IntegrityFailure,
}

#[derive(Serialize, Deserialize)]
struct TokenPayload {
    /// Fingerprint of the sort key the boundary was taken under.
    s: u32,
    /// Boundary values, one per sort-key field.
    v: Vec<CursorValue>,
}

/// Encode the boundary values of the last retained row into an opaque token.
pub fn encode_cursor(values: &[CursorValue], key: &SortKey) -> String {
    let payload = TokenPayload {
        s: key.fingerprint(),
        v: values.to_vec(),
    };
    // Serialization of these enums cannot fail.
    let bytes = serde_json::to_vec(&payload).unwrap_or_default();
    let tag = crc32fast::hash(&bytes);
    format!("{}.{:08x}", URL_SAFE_NO_PAD.encode(&bytes), tag)
}

/// Decode a token and validate it against the sort key it will be applied to.
pub fn decode_cursor(token: &str, key: &SortKey) -> Result<Vec<CursorValue>, CursorError> {
    let (body, tag_hex) = token.split_once('.').ok_or(CursorError::Malformed)?;

    let bytes = URL_SAFE_NO_PAD
        .decode(body)
        .map_err(|_| CursorError::Malformed)?;
    let tag = u32::from_str_radix(tag_hex, 16).map_err(|_| CursorError::Malformed)?;
    if crc32fast::hash(&bytes) != tag {
        return Err(CursorError::IntegrityFailure);
    }

    let payload: TokenPayload =
        serde_json::from_slice(&bytes).map_err(|_| CursorError::Malformed)?;

    if payload.s != key.fingerprint() {
        return Err(CursorError::ShapeMismatch);
    }
    if payload.v.len() != key.fields().len() {
        return Err(CursorError::ShapeMismatch);
    }
    for (value, field) in payload.v.iter().zip(key.fields()) {
        if !field.kind.matches(value) {
            return Err(CursorError::ShapeMismatch);
        }
    }

    Ok(payload.v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::keyset::{FieldKind, SortDirection, SortField};
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn title_key() -> SortKey {
        SortKey::new(
            vec![SortField::new("title", SortDirection::Asc, FieldKind::Text)],
            SortField::new("id", SortDirection::Asc, FieldKind::Int),
        )
    }

    #[test]
    fn roundtrip() {
        let key = SortKey::recency();
        let boundary = vec![
            CursorValue::Timestamp(Utc.with_ymd_and_hms(2026, 3, 14, 1, 59, 26).unwrap()),
            CursorValue::Int(271828),
        ];
        let token = encode_cursor(&boundary, &key);
        assert_eq!(decode_cursor(&token, &key).unwrap(), boundary);
    }

    #[test]
    fn token_is_url_safe() {
        let key = title_key();
        let boundary = vec![
            CursorValue::Text("Années de pèlerinage / 순례의 해".to_string()),
            CursorValue::Int(1),
        ];
        let token = encode_cursor(&boundary, &key);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        );
        assert_eq!(decode_cursor(&token, &key).unwrap(), boundary);
    }

    #[test]
    fn garbage_is_malformed() {
        let key = SortKey::recency();
        assert_matches!(
            decode_cursor("not a cursor", &key),
            Err(CursorError::Malformed)
        );
        assert_matches!(decode_cursor("", &key), Err(CursorError::Malformed));
        assert_matches!(
            decode_cursor("AAAA.zzzzzzzz", &key),
            Err(CursorError::Malformed)
        );
    }

    #[test]
    fn tampered_payload_fails_integrity() {
        let key = SortKey::recency();
        let boundary = vec![
            CursorValue::Timestamp(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
            CursorValue::Int(5),
        ];
        let token = encode_cursor(&boundary, &key);
        let (body, tag) = token.split_once('.').unwrap();
        // Flip a character in the payload while keeping the old tag.
        let mut chars: Vec<char> = body.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        let tampered = format!("{}.{}", chars.into_iter().collect::<String>(), tag);
        assert_matches!(
            decode_cursor(&tampered, &key),
            Err(CursorError::IntegrityFailure)
        );
    }

    #[test]
    fn replay_under_different_sort_key_is_rejected() {
        let recency = SortKey::recency();
        let boundary = vec![
            CursorValue::Timestamp(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
            CursorValue::Int(5),
        ];
        let token = encode_cursor(&boundary, &recency);
        assert_matches!(
            decode_cursor(&token, &title_key()),
            Err(CursorError::ShapeMismatch)
        );
    }

    #[test]
    fn forged_values_with_wrong_kinds_are_rejected() {
        let key = SortKey::recency();
        // A crafted payload declaring the right fingerprint but carrying a text
        // value where a timestamp is expected. The CRC verifies (the forger can
        // compute it) so the kind check is what must catch this.
        let payload = serde_json::json!({
            "s": key.fingerprint(),
            "v": [{"t": "2026-01-01"}, {"i": 5}],
        });
        let bytes = serde_json::to_vec(&payload).unwrap();
        let token = format!(
            "{}.{:08x}",
            URL_SAFE_NO_PAD.encode(&bytes),
            crc32fast::hash(&bytes)
        );
        assert_matches!(decode_cursor(&token, &key), Err(CursorError::ShapeMismatch));
    }
}
