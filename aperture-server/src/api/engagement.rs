//! Engagement counter endpoints
//!
//! The counter path spec: increment in the store, answer the caller
//! with the new value, and broadcast that same value to subscribers.
//! A failed store write reports an error to the caller and broadcasts
//! nothing.

use aperture_common::db::photos::{increment_like_count, increment_view_count};
use aperture_common::events::GalleryEvent;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::api::ApiError;
use crate::AppState;

/// Response to a like increment
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub photo_id: Uuid,
    pub like_count: i64,
}

/// Response to a view increment
#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub photo_id: Uuid,
    pub view_count: i64,
}

/// POST /api/photos/:id/like
pub async fn like_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
) -> Result<Json<LikeResponse>, ApiError> {
    let like_count = increment_like_count(&state.db, photo_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Unknown photo: {}", photo_id)))?;

    // The event carries the stored count the increment produced, so
    // every subscriber reconciles to the same value the caller sees.
    state.events.emit_lossy(GalleryEvent::PhotoLiked {
        photo_id,
        like_count,
        timestamp: Utc::now(),
    });

    Ok(Json(LikeResponse {
        photo_id,
        like_count,
    }))
}

/// POST /api/photos/:id/view
pub async fn view_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
) -> Result<Json<ViewResponse>, ApiError> {
    let view_count = increment_view_count(&state.db, photo_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Unknown photo: {}", photo_id)))?;

    state.events.emit_lossy(GalleryEvent::PhotoViewed {
        photo_id,
        view_count,
        timestamp: Utc::now(),
    });

    Ok(Json(ViewResponse {
        photo_id,
        view_count,
    }))
}
