//! aperture-server library - headless gallery service
//!
//! JSON content API plus an SSE event stream; no rendering layer.

use aperture_common::events::EventBus;
use axum::Router;
use sqlx::SqlitePool;

pub mod api;
pub mod pagination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus bridged to the SSE endpoint
    pub events: EventBus,
    /// Shared secret for admin API authentication (0 = auth disabled)
    pub shared_secret: i64,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, events: EventBus, shared_secret: i64) -> Self {
        Self {
            db,
            events,
            shared_secret,
        }
    }
}

/// Build application router
///
/// Read endpoints, counter increments and the event stream are public;
/// content mutations require authentication.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post, put};
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;

    // Admin routes (require authentication)
    let protected = Router::new()
        .route("/api/photos", post(api::photos::create_photo))
        .route("/api/photos/:id", put(api::photos::update_photo))
        .route("/api/photos/:id", delete(api::photos::delete_photo))
        .route("/api/categories", post(api::categories::create_category))
        .route("/api/categories/:id", delete(api::categories::delete_category))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/photos", get(api::photos::list_photos))
        .route("/api/photos/:id", get(api::photos::get_photo))
        .route("/api/categories", get(api::categories::list_categories))
        .route("/api/photos/:id/like", post(api::engagement::like_photo))
        .route("/api/photos/:id/view", post(api::engagement::view_photo))
        .route("/api/events", get(api::sse::event_stream))
        .merge(api::health::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
