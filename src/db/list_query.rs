//! Parameterized list queries with seek pagination
//!
//! `ListQuery` builds the SELECT for a list endpoint: caller-supplied filters,
//! plus the seek predicate and ORDER BY derived from a [`SortKey`], executed
//! with `LIMIT size + 1`. All values go through sqlx bind parameters.

use sqlx::SqlitePool;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};

use crate::pagination::{CursorValue, Page, PageError, PageRequest, SortKey};

/// A bindable SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Null,
}

impl SqlValue {
    /// Bind this value to a sqlx query.
    pub fn bind_to_query<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Bool(b) => query.bind(if *b { 1i64 } else { 0i64 }),
            SqlValue::Null => query.bind(None::<String>),
        }
    }
}

/// An entity that list queries can page over.
///
/// `sort_value` must return the entity's value for every column a sort key can
/// reference; it is how boundary values for the next cursor are extracted from
/// the last row of a page.
pub trait ListEntity: Sized {
    const TABLE_NAME: &'static str;

    /// Base SELECT. Override for entities read through a join view.
    fn select_sql() -> String {
        format!("SELECT * FROM {}", Self::TABLE_NAME)
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;

    /// Value of the given sort-key column for this row.
    fn sort_value(&self, column: &str) -> CursorValue;

    /// Boundary tuple of this row under `key`, in field order.
    fn boundary(&self, key: &SortKey) -> Vec<CursorValue> {
        key.fields()
            .iter()
            .map(|f| {
                // Qualified columns resolve by base name on the hydrated row.
                let column = f.column.rsplit('.').next().unwrap_or(f.column);
                self.sort_value(column)
            })
            .collect()
    }
}

/// A list query under construction.
pub struct ListQuery<E: ListEntity> {
    _phantom: std::marker::PhantomData<E>,
    where_clauses: Vec<String>,
    values: Vec<SqlValue>,
    param_counter: usize,
}

impl<E: ListEntity> ListQuery<E> {
    pub fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
            where_clauses: Vec::new(),
            values: Vec::new(),
            param_counter: 0,
        }
    }

    /// Add a single-parameter condition. The condition carries one bare `?`,
    /// which is renumbered to its sequential index.
    pub fn filter(self, condition: &str, value: SqlValue) -> Self {
        self.filter_raw(condition, vec![value])
    }

    /// Add a condition with an arbitrary number of bare `?` placeholders.
    pub fn filter_raw(mut self, condition: &str, values: Vec<SqlValue>) -> Self {
        let rewritten = self.rewrite_params(condition, values.len());
        self.where_clauses.push(rewritten);
        self.values.extend(values);
        self
    }

    /// Rewrite each bare `?` to `?N` with sequential indices.
    fn rewrite_params(&mut self, condition: &str, num_new_params: usize) -> String {
        let mut result = condition.to_string();
        for _ in 0..num_new_params {
            self.param_counter += 1;
            if let Some(pos) = result.find('?') {
                result = format!(
                    "{}?{}{}",
                    &result[..pos],
                    self.param_counter,
                    &result[pos + 1..]
                );
            }
        }
        result
    }

    fn build_sql(&self, key: &SortKey, limit: i64) -> String {
        let mut sql = E::select_sql();

        if !self.where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clauses.join(" AND "));
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(&key.order_sql());
        sql.push_str(&format!(" LIMIT {}", limit));

        sql
    }

    /// Execute one page of this query under `key`.
    ///
    /// Decodes the request's cursor against `key`, appends the seek predicate,
    /// fetches `size + 1` rows, and assembles the page.
    pub async fn fetch_page(
        mut self,
        pool: &SqlitePool,
        key: &SortKey,
        request: &PageRequest,
        max_size: i64,
    ) -> Result<Page<E>, PageError> {
        let size = request.validated_size(max_size)?;

        if let Some(boundary) = request.boundary(key)? {
            let (predicate, values) = key.seek_predicate(&boundary, self.param_counter);
            self.param_counter += values.len();
            self.where_clauses.push(predicate);
            self.values.extend(values);
        }

        let sql = self.build_sql(key, size + 1);
        tracing::debug!(sql = %sql, "Executing list query");

        let mut query = sqlx::query(&sql);
        for value in &self.values {
            query = value.bind_to_query(query);
        }

        let rows = query.fetch_all(pool).await?;
        let entities = rows
            .iter()
            .map(E::from_row)
            .collect::<Result<Vec<E>, sqlx::Error>>()?;

        Ok(Page::from_rows(entities, size, key, |e| e.boundary(key)))
    }
}

impl<E: ListEntity> Default for ListQuery<E> {
    fn default() -> Self {
        Self::new()
    }
}
