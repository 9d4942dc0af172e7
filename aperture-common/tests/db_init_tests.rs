//! Integration tests for database initialization
//!
//! Covers automatic database creation, idempotent re-init, default
//! settings, and counter column constraints.

use aperture_common::db::init::{get_setting_i64, init_database};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("aperture.db");

    let result = init_database(&db_path).await;
    assert!(
        result.is_ok(),
        "Database initialization failed: {:?}",
        result.err()
    );
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_creates_missing_parent_directory() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("deeper").join("aperture.db");

    let result = init_database(&db_path).await;
    assert!(result.is_ok());
    assert!(db_path.exists());
}

#[tokio::test]
async fn test_reinit_of_existing_database_is_safe() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("aperture.db");

    let pool1 = init_database(&db_path).await.unwrap();

    // Write a row through the first pool, then re-run init
    sqlx::query("INSERT INTO categories (guid, slug, name) VALUES ('g1', 'street', 'Street')")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path)
        .await
        .expect("re-init of existing database");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, 1, "existing data survived re-init");
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("aperture.db");

    let pool = init_database(&db_path).await.unwrap();

    assert_eq!(get_setting_i64(&pool, "http_port", 0).await.unwrap(), 5850);
    assert_eq!(
        get_setting_i64(&pool, "event_channel_capacity", 0)
            .await
            .unwrap(),
        256
    );
    assert_eq!(
        get_setting_i64(&pool, "sse_keepalive_secs", 0).await.unwrap(),
        15
    );
}

#[tokio::test]
async fn test_get_setting_falls_back_to_default() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("aperture.db");

    let pool = init_database(&db_path).await.unwrap();

    assert_eq!(
        get_setting_i64(&pool, "no_such_setting", 77).await.unwrap(),
        77
    );
}

#[tokio::test]
async fn test_counter_columns_reject_negative_values() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("aperture.db");

    let pool = init_database(&db_path).await.unwrap();

    let result = sqlx::query(
        "INSERT INTO photos (guid, title, image_path, like_count) VALUES ('g', 'T', '/i.jpg', -1)",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "negative like_count must violate CHECK");
}
