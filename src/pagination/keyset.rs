//! Sort keys and seek predicates
//!
//! A `SortKey` is an ordered list of `(column, direction, kind)` fields whose
//! final field is a unique, monotonic tie-break (the row id). It produces both
//! the `ORDER BY` clause and, given the boundary values from a cursor, the
//! lexicographic-chain `WHERE` predicate that resumes the scan strictly after
//! that boundary.

use std::cmp::Ordering;

use crate::db::list_query::SqlValue;
use crate::pagination::cursor::CursorValue;

/// Sort direction for a single key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Comparison operator that selects rows strictly beyond a boundary value.
    fn seek_op(self) -> &'static str {
        match self {
            SortDirection::Asc => ">",
            SortDirection::Desc => "<",
        }
    }
}

/// Value type carried by a key field. Used to validate decoded cursors against
/// the sort specification they are replayed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Text,
    Timestamp,
}

impl FieldKind {
    pub fn matches(self, value: &CursorValue) -> bool {
        matches!(
            (self, value),
            (FieldKind::Int, CursorValue::Int(_))
                | (FieldKind::Text, CursorValue::Text(_))
                | (FieldKind::Timestamp, CursorValue::Timestamp(_))
        )
    }
}

/// One field of a sort key.
#[derive(Debug, Clone)]
pub struct SortField {
    /// Column reference as it appears in the generated SQL. May be qualified
    /// (e.g. `n.created_at`) when the list query selects from a join.
    pub column: &'static str,
    pub direction: SortDirection,
    pub kind: FieldKind,
}

impl SortField {
    pub fn new(column: &'static str, direction: SortDirection, kind: FieldKind) -> Self {
        Self {
            column,
            direction,
            kind,
        }
    }
}

/// A tie-broken sort specification.
///
/// The final field is always the tie-break and must be globally unique and
/// monotonic, which guarantees a deterministic total order even when earlier
/// fields carry duplicate values.
#[derive(Debug, Clone)]
pub struct SortKey {
    fields: Vec<SortField>,
}

impl SortKey {
    /// Build a key from its leading fields plus the mandatory tie-break field.
    pub fn new(mut fields: Vec<SortField>, tie_break: SortField) -> Self {
        fields.push(tie_break);
        Self { fields }
    }

    /// Newest-first ordering over `(created_at DESC, id DESC)`, the ordering
    /// used by every feed in the application.
    pub fn recency() -> Self {
        Self::new(
            vec![SortField::new(
                "created_at",
                SortDirection::Desc,
                FieldKind::Timestamp,
            )],
            SortField::new("id", SortDirection::Desc, FieldKind::Int),
        )
    }

    /// Same ordering with columns qualified for a joined select.
    pub fn recency_qualified(alias: &'static str) -> Self {
        // Known aliases used by join views.
        let (created, id) = match alias {
            "n" => ("n.created_at", "n.id"),
            other => {
                debug_assert!(false, "unknown sort alias {other}");
                ("created_at", "id")
            }
        };
        Self::new(
            vec![SortField::new(
                created,
                SortDirection::Desc,
                FieldKind::Timestamp,
            )],
            SortField::new(id, SortDirection::Desc, FieldKind::Int),
        )
    }

    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    /// Stable fingerprint of the key shape (columns, directions, kinds).
    /// Embedded in cursors so a token minted under one sort specification is
    /// rejected when replayed under another.
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for field in &self.fields {
            // Strip any join qualifier so the same logical key hashes equally
            // whether or not the select aliases its table.
            let column = field.column.rsplit('.').next().unwrap_or(field.column);
            hasher.update(column.as_bytes());
            hasher.update(field.direction.to_sql().as_bytes());
            let kind = match field.kind {
                FieldKind::Int => b"i",
                FieldKind::Text => b"t",
                FieldKind::Timestamp => b"z",
            };
            hasher.update(kind);
            hasher.update(b"|");
        }
        hasher.finalize()
    }

    /// `ORDER BY` fragment, one clause per field in declared direction.
    pub fn order_sql(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{} {}", f.column, f.direction.to_sql()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Seek predicate for resuming strictly after `boundary`.
    ///
    /// For fields `f1..fn` this is the lexicographic chain
    /// `f1 < ?a OR (f1 = ?b AND f2 < ?c) OR ...` (operators flipped per-field
    /// for ascending order). Placeholders are numbered starting at
    /// `param_offset + 1` to compose with clauses already on the query.
    ///
    /// The boundary arity is the caller's responsibility; cursors are validated
    /// against the key before they get here.
    pub fn seek_predicate(
        &self,
        boundary: &[CursorValue],
        param_offset: usize,
    ) -> (String, Vec<SqlValue>) {
        debug_assert_eq!(boundary.len(), self.fields.len());

        let mut arms = Vec::with_capacity(self.fields.len());
        let mut values = Vec::new();
        let mut param = param_offset;

        for (i, field) in self.fields.iter().enumerate() {
            let mut conjuncts = Vec::with_capacity(i + 1);
            for (prefix_field, prefix_value) in self.fields.iter().zip(boundary).take(i) {
                param += 1;
                conjuncts.push(format!("{} = ?{}", prefix_field.column, param));
                values.push(prefix_value.to_sql_value());
            }
            param += 1;
            conjuncts.push(format!(
                "{} {} ?{}",
                field.column,
                field.direction.seek_op(),
                param
            ));
            values.push(boundary[i].to_sql_value());

            if conjuncts.len() == 1 {
                arms.push(conjuncts.remove(0));
            } else {
                arms.push(format!("({})", conjuncts.join(" AND ")));
            }
        }

        (format!("({})", arms.join(" OR ")), values)
    }

    /// Compare two boundary tuples under this key's declared order.
    ///
    /// `Ordering::Less` means `a` sorts before `b` in result order. Used by the
    /// in-memory paginator for merged lists.
    pub fn compare(&self, a: &[CursorValue], b: &[CursorValue]) -> Ordering {
        for (i, field) in self.fields.iter().enumerate() {
            let natural = a[i].cmp_same_kind(&b[i]);
            let ord = match field.direction {
                SortDirection::Asc => natural,
                SortDirection::Desc => natural.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[test]
    fn recency_order_sql() {
        assert_eq!(SortKey::recency().order_sql(), "created_at DESC, id DESC");
    }

    #[test]
    fn seek_predicate_two_fields() {
        let key = SortKey::recency();
        let boundary = vec![
            CursorValue::Timestamp(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()),
            CursorValue::Int(42),
        ];
        let (sql, values) = key.seek_predicate(&boundary, 0);
        assert_eq!(sql, "(created_at < ?1 OR (created_at = ?2 AND id < ?3))");
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn seek_predicate_respects_param_offset() {
        let key = SortKey::recency();
        let boundary = vec![
            CursorValue::Timestamp(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()),
            CursorValue::Int(7),
        ];
        let (sql, _) = key.seek_predicate(&boundary, 2);
        assert_eq!(sql, "(created_at < ?3 OR (created_at = ?4 AND id < ?5))");
    }

    #[test]
    fn seek_predicate_ascending_flips_operators() {
        let key = SortKey::new(
            vec![SortField::new("title", SortDirection::Asc, FieldKind::Text)],
            SortField::new("id", SortDirection::Asc, FieldKind::Int),
        );
        let boundary = vec![
            CursorValue::Text("Brahms".to_string()),
            CursorValue::Int(9),
        ];
        let (sql, _) = key.seek_predicate(&boundary, 0);
        assert_eq!(sql, "(title > ?1 OR (title = ?2 AND id > ?3))");
    }

    #[test]
    fn fingerprint_ignores_join_qualifiers() {
        assert_eq!(
            SortKey::recency().fingerprint(),
            SortKey::recency_qualified("n").fingerprint()
        );
    }

    #[test]
    fn fingerprint_changes_with_direction() {
        let asc = SortKey::new(
            vec![SortField::new(
                "created_at",
                SortDirection::Asc,
                FieldKind::Timestamp,
            )],
            SortField::new("id", SortDirection::Asc, FieldKind::Int),
        );
        assert_ne!(asc.fingerprint(), SortKey::recency().fingerprint());
    }

    #[test]
    fn compare_orders_newest_first_with_id_tiebreak() {
        let key = SortKey::recency();
        let t = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let older = vec![CursorValue::Timestamp(t), CursorValue::Int(2)];
        let newer_id = vec![CursorValue::Timestamp(t), CursorValue::Int(3)];
        assert_eq!(key.compare(&newer_id, &older), Ordering::Less);
        assert_eq!(key.compare(&older, &older), Ordering::Equal);
    }
}
