//! Composers database operations
//!
//! Composers are the reference data curation posts attach to. A curation post
//! names one primary composer plus any number of additional ones through the
//! `post_composers` join table.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::db::sqlite_helpers::{now_str, str_to_datetime};

/// Musical era a composer is classified under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Era {
    Baroque,
    Classical,
    Romantic,
    Modern,
}

impl Era {
    pub fn as_str(&self) -> &'static str {
        match self {
            Era::Baroque => "baroque",
            Era::Classical => "classical",
            Era::Romantic => "romantic",
            Era::Modern => "modern",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "baroque" => Some(Era::Baroque),
            "classical" => Some(Era::Classical),
            "romantic" => Some(Era::Romantic),
            "modern" => Some(Era::Modern),
            _ => None,
        }
    }
}

/// Continent of a composer's origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Continent {
    Europe,
    Asia,
    America,
    Africa,
    Oceania,
}

impl Continent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Continent::Europe => "europe",
            Continent::Asia => "asia",
            Continent::America => "america",
            Continent::Africa => "africa",
            Continent::Oceania => "oceania",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "europe" => Some(Continent::Europe),
            "asia" => Some(Continent::Asia),
            "america" => Some(Continent::America),
            "africa" => Some(Continent::Africa),
            "oceania" => Some(Continent::Oceania),
            _ => None,
        }
    }
}

/// A composer record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposerRecord {
    pub id: i64,
    pub name: String,
    pub era: String,
    pub continent: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for ComposerRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let created_at_str: String = row.try_get("created_at")?;
        let updated_at_str: String = row.try_get("updated_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            era: row.try_get("era")?,
            continent: row.try_get("continent")?,
            created_at: str_to_datetime(&created_at_str)
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
            updated_at: str_to_datetime(&updated_at_str)
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
        })
    }
}

/// Input for creating a new composer
#[derive(Debug, Clone)]
pub struct CreateComposer {
    pub name: String,
    pub era: Era,
    pub continent: Continent,
}

/// Composers repository for database operations
pub struct ComposerRepository {
    pool: SqlitePool,
}

impl ComposerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new composer
    pub async fn create(&self, composer: CreateComposer) -> Result<ComposerRecord> {
        let now = now_str();
        let result = sqlx::query(
            r#"
            INSERT INTO composers (name, era, continent, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&composer.name)
        .bind(composer.era.as_str())
        .bind(composer.continent.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve composer after insert"))
    }

    /// Get a composer by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<ComposerRecord>> {
        let record = sqlx::query_as::<_, ComposerRecord>("SELECT * FROM composers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Bulk-load the composer lists for a set of posts.
    ///
    /// This is the second phase of the two-phase page hydration: the paged
    /// query returns bare post rows, then one query here loads all attached
    /// composers for exactly those ids. Composers are ordered by name within
    /// each post.
    pub async fn for_posts(&self, post_ids: &[i64]) -> Result<HashMap<i64, Vec<ComposerRecord>>> {
        let mut by_post: HashMap<i64, Vec<ComposerRecord>> = HashMap::new();
        if post_ids.is_empty() {
            return Ok(by_post);
        }

        let placeholders = (1..=post_ids.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            r#"
            SELECT pc.post_id AS post_id, c.*
            FROM post_composers pc
            JOIN composers c ON c.id = pc.composer_id
            WHERE pc.post_id IN ({placeholders})
            ORDER BY pc.post_id, c.name
            "#
        );

        let mut query = sqlx::query(&sql);
        for id in post_ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        use sqlx::{FromRow, Row};
        for row in &rows {
            let post_id: i64 = row.try_get("post_id")?;
            let composer = ComposerRecord::from_row(row)?;
            by_post.entry(post_id).or_default().push(composer);
        }

        Ok(by_post)
    }
}

/// Attach a composer to a post inside an open transaction
pub async fn attach_composer(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    post_id: i64,
    composer_id: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO post_composers (post_id, composer_id)
        VALUES (?1, ?2)
        "#,
    )
    .bind(post_id)
    .bind(composer_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn era_roundtrip() {
        for era in [Era::Baroque, Era::Classical, Era::Romantic, Era::Modern] {
            assert_eq!(Era::from_str(era.as_str()), Some(era));
        }
        assert_eq!(Era::from_str("medieval"), None);
    }

    #[test]
    fn continent_roundtrip() {
        for continent in [
            Continent::Europe,
            Continent::Asia,
            Continent::America,
            Continent::Africa,
            Continent::Oceania,
        ] {
            assert_eq!(Continent::from_str(continent.as_str()), Some(continent));
        }
    }
}
