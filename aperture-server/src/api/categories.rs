//! Category API: public navigation listing, admin create/delete

use aperture_common::db::categories::{
    self, Category, CategoryWithCount,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ApiError;
use crate::AppState;

/// Category listing response
#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryWithCount>,
}

/// Admin request to create a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub slug: String,
    pub name: String,
}

/// GET /api/categories
///
/// All categories with per-category photo counts, for gallery
/// navigation.
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let categories = categories::list_categories_with_counts(&state.db).await?;
    Ok(Json(CategoryListResponse { categories }))
}

/// POST /api/categories (admin)
pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    if !is_valid_slug(&request.slug) {
        return Err(ApiError::BadRequest(format!(
            "Invalid category slug: {}",
            request.slug
        )));
    }
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Category name must not be empty".to_string(),
        ));
    }

    if categories::load_category_by_slug(&state.db, &request.slug)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Category slug already exists: {}",
            request.slug
        )));
    }

    let category = Category::new(&request.slug, &request.name);
    categories::insert_category(&state.db, &category).await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// DELETE /api/categories/:id (admin)
///
/// Photos in the category are kept and become uncategorized.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = categories::delete_category(&state.db, category_id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!(
            "Unknown category: {}",
            category_id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Slugs appear in URLs: lowercase alphanumerics and hyphens only
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() < 100
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("street"));
        assert!(is_valid_slug("black-and-white"));
        assert!(is_valid_slug("35mm"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Street"));
        assert!(!is_valid_slug("with space"));
        assert!(!is_valid_slug("under_score"));
        assert!(!is_valid_slug(&"x".repeat(100)));
    }
}
