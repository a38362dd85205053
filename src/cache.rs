//! In-memory caching using moka
//!
//! Venue and category rows change rarely compared to how often the catalog
//! is read, so they are cached with short TTLs and invalidated on admin
//! writes.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::models::venue::{Category, Venue};

/// Application cache holding catalog data
#[derive(Clone)]
pub struct AppCache {
    /// Venues (slug -> Venue)
    pub venues: Cache<String, Arc<Venue>>,
    /// Category listing (singleton)
    pub categories: Cache<String, Arc<Vec<Category>>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Venues: 500 entries, 10 min TTL, 5 min idle
            venues: Cache::builder()
                .max_capacity(500)
                .time_to_live(Duration::from_secs(10 * 60))
                .time_to_idle(Duration::from_secs(5 * 60))
                .build(),

            // Categories: 1 entry, 30 min TTL
            categories: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(30 * 60))
                .build(),
        }
    }

    /// Invalidate cached catalog data after an admin write.
    pub fn invalidate_catalog(&self) {
        self.venues.invalidate_all();
        self.categories.invalidate_all();
        info!("Catalog cache invalidated");
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}
