//! Photo database operations

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Photo record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub guid: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    /// Path or URL of the image asset; the service stores the
    /// reference, not the bytes.
    pub image_path: String,
    /// Capture date as supplied by the photographer (free-form text)
    pub taken_at: Option<String>,
    pub like_count: i64,
    pub view_count: i64,
}

/// Editable photo fields, shared by create and update
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoMetadata {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub image_path: String,
    #[serde(default)]
    pub taken_at: Option<String>,
}

impl Photo {
    /// Create a new photo with zeroed counters
    pub fn new(meta: PhotoMetadata) -> Self {
        Self {
            guid: Uuid::new_v4(),
            title: meta.title,
            description: meta.description,
            category_id: meta.category_id,
            image_path: meta.image_path,
            taken_at: meta.taken_at,
            like_count: 0,
            view_count: 0,
        }
    }
}

/// Sort order for gallery listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSort {
    Newest,
    Oldest,
    Title,
    MostLiked,
    MostViewed,
}

impl PhotoSort {
    /// Parse a `sort` query parameter value
    pub fn from_query(value: &str) -> Option<Self> {
        match value {
            "newest" => Some(PhotoSort::Newest),
            "oldest" => Some(PhotoSort::Oldest),
            "title" => Some(PhotoSort::Title),
            "most_liked" => Some(PhotoSort::MostLiked),
            "most_viewed" => Some(PhotoSort::MostViewed),
            _ => None,
        }
    }

    /// ORDER BY clause for this sort (static strings only)
    fn order_clause(&self) -> &'static str {
        match self {
            PhotoSort::Newest => "created_at DESC, guid",
            PhotoSort::Oldest => "created_at ASC, guid",
            PhotoSort::Title => "title COLLATE NOCASE ASC, guid",
            PhotoSort::MostLiked => "like_count DESC, guid",
            PhotoSort::MostViewed => "view_count DESC, guid",
        }
    }
}

impl Default for PhotoSort {
    fn default() -> Self {
        PhotoSort::Newest
    }
}

fn photo_from_row(row: &SqliteRow) -> Result<Photo> {
    let guid_str: String = row.get("guid");
    let category_str: Option<String> = row.get("category_id");

    let category_id = match category_str {
        Some(s) => Some(parse_uuid(&s)?),
        None => None,
    };

    Ok(Photo {
        guid: parse_uuid(&guid_str)?,
        title: row.get("title"),
        description: row.get("description"),
        category_id,
        image_path: row.get("image_path"),
        taken_at: row.get("taken_at"),
        like_count: row.get("like_count"),
        view_count: row.get("view_count"),
    })
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("Invalid uuid in database: {}", e)))
}

/// Save a new photo
pub async fn insert_photo(pool: &SqlitePool, photo: &Photo) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO photos (guid, title, description, category_id, image_path, taken_at,
                            like_count, view_count, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(photo.guid.to_string())
    .bind(&photo.title)
    .bind(&photo.description)
    .bind(photo.category_id.map(|id| id.to_string()))
    .bind(&photo.image_path)
    .bind(&photo.taken_at)
    .bind(photo.like_count)
    .bind(photo.view_count)
    .execute(pool)
    .await?;

    Ok(())
}

/// Update a photo's metadata, leaving its counters untouched
///
/// Returns false if no photo with that guid exists.
pub async fn update_photo(pool: &SqlitePool, guid: Uuid, meta: &PhotoMetadata) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE photos
        SET title = ?, description = ?, category_id = ?, image_path = ?, taken_at = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(&meta.title)
    .bind(&meta.description)
    .bind(meta.category_id.map(|id| id.to_string()))
    .bind(&meta.image_path)
    .bind(&meta.taken_at)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a photo; returns false if it did not exist
pub async fn delete_photo(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM photos WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load a photo by guid
pub async fn load_photo(pool: &SqlitePool, guid: Uuid) -> Result<Option<Photo>> {
    let row = sqlx::query(
        r#"
        SELECT guid, title, description, category_id, image_path, taken_at,
               like_count, view_count
        FROM photos
        WHERE guid = ?
        "#,
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(photo_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Count photos, optionally restricted to one category
pub async fn count_photos(pool: &SqlitePool, category_id: Option<Uuid>) -> Result<i64> {
    let count: i64 = match category_id {
        Some(id) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM photos WHERE category_id = ?")
                .bind(id.to_string())
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM photos")
                .fetch_one(pool)
                .await?
        }
    };

    Ok(count)
}

/// Paginated gallery listing with optional category filter
pub async fn list_photos(
    pool: &SqlitePool,
    category_id: Option<Uuid>,
    sort: PhotoSort,
    limit: i64,
    offset: i64,
) -> Result<Vec<Photo>> {
    // The ORDER BY clause comes from a closed enum, never from user
    // input, so string assembly is injection-safe here.
    let rows = match category_id {
        Some(id) => {
            let sql = format!(
                "SELECT guid, title, description, category_id, image_path, taken_at, \
                 like_count, view_count \
                 FROM photos WHERE category_id = ? ORDER BY {} LIMIT ? OFFSET ?",
                sort.order_clause()
            );
            sqlx::query(&sql)
                .bind(id.to_string())
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!(
                "SELECT guid, title, description, category_id, image_path, taken_at, \
                 like_count, view_count \
                 FROM photos ORDER BY {} LIMIT ? OFFSET ?",
                sort.order_clause()
            );
            sqlx::query(&sql)
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?
        }
    };

    rows.iter().map(photo_from_row).collect()
}

/// Increment a photo's like counter
///
/// A single UPDATE with RETURNING: the value handed back is exactly
/// the stored count produced by this increment, which is what gets
/// broadcast to subscribers. Returns None for an unknown guid.
pub async fn increment_like_count(pool: &SqlitePool, guid: Uuid) -> Result<Option<i64>> {
    let count = sqlx::query_scalar(
        "UPDATE photos SET like_count = like_count + 1 WHERE guid = ? RETURNING like_count",
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(count)
}

/// Increment a photo's view counter
pub async fn increment_view_count(pool: &SqlitePool, guid: Uuid) -> Result<Option<i64>> {
    let count = sqlx::query_scalar(
        "UPDATE photos SET view_count = view_count + 1 WHERE guid = ? RETURNING view_count",
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_schema;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("in-memory database");
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();
        pool
    }

    fn meta(title: &str, image: &str) -> PhotoMetadata {
        PhotoMetadata {
            title: title.to_string(),
            description: None,
            category_id: None,
            image_path: image.to_string(),
            taken_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_load_photo() {
        let pool = test_pool().await;

        let photo = Photo::new(meta("Dunes at dusk", "/img/dunes.jpg"));
        insert_photo(&pool, &photo).await.unwrap();

        let loaded = load_photo(&pool, photo.guid)
            .await
            .unwrap()
            .expect("photo exists");
        assert_eq!(loaded.title, "Dunes at dusk");
        assert_eq!(loaded.image_path, "/img/dunes.jpg");
        assert_eq!(loaded.like_count, 0);
        assert_eq!(loaded.view_count, 0);
    }

    #[tokio::test]
    async fn test_update_preserves_counters() {
        let pool = test_pool().await;

        let photo = Photo::new(meta("Old title", "/img/a.jpg"));
        insert_photo(&pool, &photo).await.unwrap();
        increment_like_count(&pool, photo.guid).await.unwrap();
        increment_view_count(&pool, photo.guid).await.unwrap();

        let changed = update_photo(&pool, photo.guid, &meta("New title", "/img/a.jpg"))
            .await
            .unwrap();
        assert!(changed);

        let loaded = load_photo(&pool, photo.guid).await.unwrap().unwrap();
        assert_eq!(loaded.title, "New title");
        assert_eq!(loaded.like_count, 1);
        assert_eq!(loaded.view_count, 1);
    }

    #[tokio::test]
    async fn test_update_unknown_photo_returns_false() {
        let pool = test_pool().await;
        let changed = update_photo(&pool, Uuid::new_v4(), &meta("x", "/img/x.jpg"))
            .await
            .unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn test_delete_photo() {
        let pool = test_pool().await;

        let photo = Photo::new(meta("Doomed", "/img/d.jpg"));
        insert_photo(&pool, &photo).await.unwrap();

        assert!(delete_photo(&pool, photo.guid).await.unwrap());
        assert!(load_photo(&pool, photo.guid).await.unwrap().is_none());
        assert!(!delete_photo(&pool, photo.guid).await.unwrap());
    }

    #[tokio::test]
    async fn test_increment_returns_stored_value() {
        let pool = test_pool().await;

        let photo = Photo::new(meta("Counted", "/img/c.jpg"));
        insert_photo(&pool, &photo).await.unwrap();

        assert_eq!(
            increment_like_count(&pool, photo.guid).await.unwrap(),
            Some(1)
        );
        assert_eq!(
            increment_like_count(&pool, photo.guid).await.unwrap(),
            Some(2)
        );
        assert_eq!(
            increment_view_count(&pool, photo.guid).await.unwrap(),
            Some(1)
        );

        let loaded = load_photo(&pool, photo.guid).await.unwrap().unwrap();
        assert_eq!(loaded.like_count, 2);
        assert_eq!(loaded.view_count, 1);
    }

    #[tokio::test]
    async fn test_increment_unknown_photo_returns_none() {
        let pool = test_pool().await;
        assert_eq!(
            increment_like_count(&pool, Uuid::new_v4()).await.unwrap(),
            None
        );
        assert_eq!(
            increment_view_count(&pool, Uuid::new_v4()).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_list_photos_category_filter_and_sort() {
        let pool = test_pool().await;

        let landscapes = crate::db::categories::Category::new("landscapes", "Landscapes");
        crate::db::categories::insert_category(&pool, &landscapes)
            .await
            .unwrap();

        let mut in_category = Photo::new(meta("B side", "/img/1.jpg"));
        in_category.category_id = Some(landscapes.guid);
        insert_photo(&pool, &in_category).await.unwrap();

        let mut also_in = Photo::new(meta("A side", "/img/2.jpg"));
        also_in.category_id = Some(landscapes.guid);
        insert_photo(&pool, &also_in).await.unwrap();

        let uncategorized = Photo::new(meta("Loose", "/img/3.jpg"));
        insert_photo(&pool, &uncategorized).await.unwrap();

        // Like the A side twice so MostLiked puts it first
        increment_like_count(&pool, also_in.guid).await.unwrap();
        increment_like_count(&pool, also_in.guid).await.unwrap();

        assert_eq!(count_photos(&pool, None).await.unwrap(), 3);
        assert_eq!(
            count_photos(&pool, Some(landscapes.guid)).await.unwrap(),
            2
        );

        let filtered = list_photos(&pool, Some(landscapes.guid), PhotoSort::Title, 10, 0)
            .await
            .unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].title, "A side");
        assert_eq!(filtered[1].title, "B side");

        let by_likes = list_photos(&pool, None, PhotoSort::MostLiked, 10, 0)
            .await
            .unwrap();
        assert_eq!(by_likes[0].guid, also_in.guid);
    }

    #[tokio::test]
    async fn test_list_photos_pagination() {
        let pool = test_pool().await;

        for i in 0..5 {
            let photo = Photo::new(meta(&format!("Photo {}", i), "/img/p.jpg"));
            insert_photo(&pool, &photo).await.unwrap();
        }

        let page = list_photos(&pool, None, PhotoSort::Title, 2, 2)
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "Photo 2");
        assert_eq!(page[1].title, "Photo 3");
    }

    #[test]
    fn test_sort_from_query() {
        assert_eq!(PhotoSort::from_query("newest"), Some(PhotoSort::Newest));
        assert_eq!(
            PhotoSort::from_query("most_viewed"),
            Some(PhotoSort::MostViewed)
        );
        assert_eq!(PhotoSort::from_query("sideways"), None);
    }
}
