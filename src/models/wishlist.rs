//! Wishlist and review models

use sqlx::FromRow;

/// Review joined with the reviewer's username for the venue page
#[derive(Debug, Clone, FromRow)]
pub struct ReviewItem {
    pub username: String,
    pub rating: i16,
    pub comment: String,
}
