//! Category database operations

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Category record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub guid: Uuid,
    pub slug: String,
    pub name: String,
}

/// Category with its photo count, for gallery navigation
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithCount {
    pub guid: Uuid,
    pub slug: String,
    pub name: String,
    pub photo_count: i64,
}

impl Category {
    pub fn new(slug: &str, name: &str) -> Self {
        Self {
            guid: Uuid::new_v4(),
            slug: slug.to_string(),
            name: name.to_string(),
        }
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("Invalid uuid in database: {}", e)))
}

/// Save a new category
///
/// A duplicate slug surfaces as a database error; callers check for
/// an existing slug first to report the conflict cleanly.
pub async fn insert_category(pool: &SqlitePool, category: &Category) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO categories (guid, slug, name, created_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(category.guid.to_string())
    .bind(&category.slug)
    .bind(&category.name)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a category; its photos stay, uncategorized (FK SET NULL).
/// Returns false if it did not exist.
pub async fn delete_category(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM categories WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load a category by guid
pub async fn load_category(pool: &SqlitePool, guid: Uuid) -> Result<Option<Category>> {
    let row = sqlx::query("SELECT guid, slug, name FROM categories WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            Ok(Some(Category {
                guid: parse_uuid(&guid_str)?,
                slug: row.get("slug"),
                name: row.get("name"),
            }))
        }
        None => Ok(None),
    }
}

/// Load a category by its URL slug
pub async fn load_category_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Category>> {
    let row = sqlx::query("SELECT guid, slug, name FROM categories WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            Ok(Some(Category {
                guid: parse_uuid(&guid_str)?,
                slug: row.get("slug"),
                name: row.get("name"),
            }))
        }
        None => Ok(None),
    }
}

/// All categories with per-category photo counts, ordered by name
pub async fn list_categories_with_counts(pool: &SqlitePool) -> Result<Vec<CategoryWithCount>> {
    let rows = sqlx::query(
        r#"
        SELECT c.guid, c.slug, c.name, COUNT(p.guid) AS photo_count
        FROM categories c
        LEFT JOIN photos p ON p.category_id = c.guid
        GROUP BY c.guid, c.slug, c.name
        ORDER BY c.name COLLATE NOCASE
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let guid_str: String = row.get("guid");
            Ok(CategoryWithCount {
                guid: parse_uuid(&guid_str)?,
                slug: row.get("slug"),
                name: row.get("name"),
                photo_count: row.get("photo_count"),
            })
        })
        .collect()
}
