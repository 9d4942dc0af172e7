//! Gallery content API: listing, single fetch, admin CRUD

use aperture_common::db::categories::load_category;
use aperture_common::db::photos::{
    self, Photo, PhotoMetadata, PhotoSort,
};
use aperture_common::events::GalleryEvent;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ApiError;
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

/// Query parameters for the gallery listing
#[derive(Debug, Deserialize)]
pub struct PhotoListQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,

    /// Category slug to filter by (optional)
    pub category: Option<String>,

    /// Sort order: newest (default), oldest, title, most_liked,
    /// most_viewed
    pub sort: Option<String>,
}

fn default_page() -> i64 {
    1
}

/// Gallery listing response
#[derive(Debug, Serialize)]
pub struct PhotoListResponse {
    pub total_results: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub category: Option<String>,
    pub sort: String,
    pub photos: Vec<Photo>,
}

/// GET /api/photos
///
/// Paginated gallery listing with optional category filter and sort.
pub async fn list_photos(
    State(state): State<AppState>,
    Query(query): Query<PhotoListQuery>,
) -> Result<Json<PhotoListResponse>, ApiError> {
    let sort = match query.sort.as_deref() {
        None => PhotoSort::default(),
        Some(value) => PhotoSort::from_query(value)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid sort order: {}", value)))?,
    };

    // Resolve the category slug before counting so an unknown slug is
    // a 404, not an empty page 1 of 0.
    let category_id = match &query.category {
        Some(slug) => {
            let category = aperture_common::db::categories::load_category_by_slug(&state.db, slug)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Unknown category: {}", slug)))?;
            Some(category.guid)
        }
        None => None,
    };

    let total_results = photos::count_photos(&state.db, category_id).await?;
    let p = calculate_pagination(total_results, query.page);

    let photos = photos::list_photos(&state.db, category_id, sort, PAGE_SIZE, p.offset).await?;

    Ok(Json(PhotoListResponse {
        total_results,
        page: p.page,
        page_size: PAGE_SIZE,
        total_pages: p.total_pages,
        category: query.category,
        sort: query.sort.unwrap_or_else(|| "newest".to_string()),
        photos,
    }))
}

/// GET /api/photos/:id
pub async fn get_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
) -> Result<Json<Photo>, ApiError> {
    let photo = photos::load_photo(&state.db, photo_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Unknown photo: {}", photo_id)))?;

    Ok(Json(photo))
}

/// POST /api/photos (admin)
///
/// Creates a photo with zeroed counters and broadcasts PhotoCreated.
pub async fn create_photo(
    State(state): State<AppState>,
    Json(meta): Json<PhotoMetadata>,
) -> Result<(StatusCode, Json<Photo>), ApiError> {
    validate_metadata(&state, &meta).await?;

    let photo = Photo::new(meta);
    photos::insert_photo(&state.db, &photo).await?;

    state.events.emit_lossy(GalleryEvent::PhotoCreated {
        photo_id: photo.guid,
        timestamp: Utc::now(),
    });

    Ok((StatusCode::CREATED, Json(photo)))
}

/// PUT /api/photos/:id (admin)
///
/// Updates photo metadata; counters are never touched here.
pub async fn update_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
    Json(meta): Json<PhotoMetadata>,
) -> Result<Json<Photo>, ApiError> {
    validate_metadata(&state, &meta).await?;

    let changed = photos::update_photo(&state.db, photo_id, &meta).await?;
    if !changed {
        return Err(ApiError::NotFound(format!("Unknown photo: {}", photo_id)));
    }

    state.events.emit_lossy(GalleryEvent::PhotoUpdated {
        photo_id,
        timestamp: Utc::now(),
    });

    let photo = photos::load_photo(&state.db, photo_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Unknown photo: {}", photo_id)))?;

    Ok(Json(photo))
}

/// DELETE /api/photos/:id (admin)
pub async fn delete_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = photos::delete_photo(&state.db, photo_id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("Unknown photo: {}", photo_id)));
    }

    state.events.emit_lossy(GalleryEvent::PhotoDeleted {
        photo_id,
        timestamp: Utc::now(),
    });

    Ok(StatusCode::NO_CONTENT)
}

/// Reject empty required fields and dangling category references
async fn validate_metadata(state: &AppState, meta: &PhotoMetadata) -> Result<(), ApiError> {
    if meta.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Photo title must not be empty".to_string()));
    }
    if meta.image_path.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Photo image_path must not be empty".to_string(),
        ));
    }

    if let Some(category_id) = meta.category_id {
        if load_category(&state.db, category_id).await?.is_none() {
            return Err(ApiError::BadRequest(format!(
                "Unknown category: {}",
                category_id
            )));
        }
    }

    Ok(())
}
