//! HTTP API handlers for aperture-server

pub mod auth;
pub mod categories;
pub mod engagement;
pub mod error;
pub mod health;
pub mod photos;
pub mod sse;

pub use error::ApiError;
