//! Venue booking platform: catalog browsing, wishlists and reviews, a
//! booking lifecycle with admin approval, and payment records kept in sync
//! with their bookings.

pub mod auth;
pub mod booking;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod flash;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::AppCache;
use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: AppCache,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            cache: AppCache::new(),
            config: Arc::new(config),
        }
    }
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::venues::router())
        .merge(routes::wishlist::router())
        .merge(routes::manage::router())
        .merge(booking::router())
        .nest_service("/static", ServeDir::new("static"))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
