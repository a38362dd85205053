//! Database queries for the venue catalog, accounts and wishlists.
//!
//! All queries use sqlx with bind parameters.

use rust_decimal::Decimal;
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::venue::{AddOn, Category, Venue};
use crate::models::wishlist::ReviewItem;
use crate::models::User;

const VENUE_COLUMNS: &str = r#"
    id, category_id, name, slug, description, location, city, address,
    price_per_hour, capacity, facilities, image_url,
    available_start_time, available_end_time, created_at, updated_at
"#;

/// Resolve the user behind a live session token.
pub async fn get_session_user(pool: &PgPool, token: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.email, u.is_staff, u.created_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = $1 AND s.expires_at > now()
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn get_venue_by_slug(
    exec: impl PgExecutor<'_>,
    slug: &str,
) -> Result<Option<Venue>, AppError> {
    let venue = sqlx::query_as::<_, Venue>(&format!(
        "SELECT {VENUE_COLUMNS} FROM venues WHERE slug = $1"
    ))
    .bind(slug)
    .fetch_optional(exec)
    .await?;

    Ok(venue)
}

pub async fn get_venue_by_id(
    exec: impl PgExecutor<'_>,
    venue_id: i64,
) -> Result<Option<Venue>, AppError> {
    let venue = sqlx::query_as::<_, Venue>(&format!(
        "SELECT {VENUE_COLUMNS} FROM venues WHERE id = $1"
    ))
    .bind(venue_id)
    .fetch_optional(exec)
    .await?;

    Ok(venue)
}

/// Catalog listing with optional city / category / price filters.
pub async fn list_venues(
    pool: &PgPool,
    city: Option<&str>,
    category_slug: Option<&str>,
    max_price: Option<Decimal>,
) -> Result<Vec<Venue>, AppError> {
    let venues = sqlx::query_as::<_, Venue>(&format!(
        r#"
        SELECT {VENUE_COLUMNS}
        FROM venues
        WHERE ($1::TEXT IS NULL OR city = $1)
          AND ($2::TEXT IS NULL OR category_id = (SELECT id FROM categories WHERE slug = $2))
          AND ($3::NUMERIC IS NULL OR price_per_hour <= $3)
        ORDER BY name
        "#
    ))
    .bind(city)
    .bind(category_slug)
    .bind(max_price)
    .fetch_all(pool)
    .await?;

    Ok(venues)
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, AppError> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, slug FROM categories ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

pub async fn get_category_name(pool: &PgPool, category_id: i64) -> Result<String, AppError> {
    let name = sqlx::query_scalar::<_, String>("SELECT name FROM categories WHERE id = $1")
        .bind(category_id)
        .fetch_optional(pool)
        .await?;

    Ok(name.unwrap_or_default())
}

pub async fn addons_for_venue(pool: &PgPool, venue_id: i64) -> Result<Vec<AddOn>, AppError> {
    let addons = sqlx::query_as::<_, AddOn>(
        r#"
        SELECT id, venue_id, name, description, price
        FROM addons
        WHERE venue_id = $1
        ORDER BY name
        "#,
    )
    .bind(venue_id)
    .fetch_all(pool)
    .await?;

    Ok(addons)
}

pub async fn reviews_for_venue(
    pool: &PgPool,
    venue_id: i64,
) -> Result<Vec<ReviewItem>, AppError> {
    let reviews = sqlx::query_as::<_, ReviewItem>(
        r#"
        SELECT u.username, r.rating, r.comment
        FROM reviews r
        JOIN users u ON u.id = r.user_id
        WHERE r.venue_id = $1
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(venue_id)
    .fetch_all(pool)
    .await?;

    Ok(reviews)
}

/// One review per user/venue pair; resubmission overwrites.
pub async fn upsert_review(
    pool: &PgPool,
    user_id: i64,
    venue_id: i64,
    rating: i16,
    comment: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO reviews (user_id, venue_id, rating, comment)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, venue_id)
        DO UPDATE SET rating = EXCLUDED.rating, comment = EXCLUDED.comment, updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(venue_id)
    .bind(rating)
    .bind(comment)
    .execute(pool)
    .await?;

    Ok(())
}

/// Toggle the user's wishlist entry for a venue. Returns whether the venue is
/// wishlisted afterwards.
pub async fn toggle_wishlist(
    pool: &PgPool,
    user_id: i64,
    venue_id: i64,
) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO wishlists (user_id, venue_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, venue_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(venue_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let wishlisted = if inserted == 0 {
        sqlx::query("DELETE FROM wishlists WHERE user_id = $1 AND venue_id = $2")
            .bind(user_id)
            .bind(venue_id)
            .execute(&mut *tx)
            .await?;
        false
    } else {
        true
    };

    tx.commit().await?;
    Ok(wishlisted)
}

pub async fn wishlist_count(pool: &PgPool, user_id: i64) -> Result<i64, AppError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM wishlists WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    Ok(count)
}

pub async fn wishlist_venues(pool: &PgPool, user_id: i64) -> Result<Vec<Venue>, AppError> {
    let venues = sqlx::query_as::<_, Venue>(
        r#"
        SELECT
            v.id, v.category_id, v.name, v.slug, v.description, v.location,
            v.city, v.address, v.price_per_hour, v.capacity, v.facilities,
            v.image_url, v.available_start_time, v.available_end_time,
            v.created_at, v.updated_at
        FROM wishlists w
        JOIN venues v ON v.id = w.venue_id
        WHERE w.user_id = $1
        ORDER BY w.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(venues)
}

/// Fields accepted by the admin venue form.
#[derive(Debug, Clone)]
pub struct VenueInput {
    pub category_id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub location: String,
    pub city: String,
    pub address: String,
    pub price_per_hour: Decimal,
    pub capacity: i32,
    pub facilities: String,
    pub image_url: String,
    pub available_start_time: Option<chrono::NaiveTime>,
    pub available_end_time: Option<chrono::NaiveTime>,
}

const DUPLICATE_SLUG_MESSAGE: &str =
    "This venue slug is already in use. Choose another name or slug.";

pub async fn create_venue(pool: &PgPool, input: &VenueInput) -> Result<Venue, AppError> {
    sqlx::query_as::<_, Venue>(&format!(
        r#"
        INSERT INTO venues (
            category_id, name, slug, description, location, city, address,
            price_per_hour, capacity, facilities, image_url,
            available_start_time, available_end_time
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING {VENUE_COLUMNS}
        "#
    ))
    .bind(input.category_id)
    .bind(&input.name)
    .bind(&input.slug)
    .bind(&input.description)
    .bind(&input.location)
    .bind(&input.city)
    .bind(&input.address)
    .bind(input.price_per_hour)
    .bind(input.capacity)
    .bind(&input.facilities)
    .bind(&input.image_url)
    .bind(input.available_start_time)
    .bind(input.available_end_time)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_SLUG_MESSAGE))
}

pub async fn update_venue(
    pool: &PgPool,
    venue_id: i64,
    input: &VenueInput,
) -> Result<Venue, AppError> {
    sqlx::query_as::<_, Venue>(&format!(
        r#"
        UPDATE venues SET
            category_id = $2, name = $3, slug = $4, description = $5,
            location = $6, city = $7, address = $8, price_per_hour = $9,
            capacity = $10, facilities = $11, image_url = $12,
            available_start_time = $13, available_end_time = $14,
            updated_at = now()
        WHERE id = $1
        RETURNING {VENUE_COLUMNS}
        "#
    ))
    .bind(venue_id)
    .bind(input.category_id)
    .bind(&input.name)
    .bind(&input.slug)
    .bind(&input.description)
    .bind(&input.location)
    .bind(&input.city)
    .bind(&input.address)
    .bind(input.price_per_hour)
    .bind(input.capacity)
    .bind(&input.facilities)
    .bind(&input.image_url)
    .bind(input.available_start_time)
    .bind(input.available_end_time)
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_SLUG_MESSAGE))?
    .ok_or(AppError::NotFound)
}

/// Deleting a venue cascades to its add-ons, bookings and payments.
pub async fn delete_venue(pool: &PgPool, venue_id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM venues WHERE id = $1")
        .bind(venue_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn insert_addon(
    pool: &PgPool,
    venue_id: i64,
    name: &str,
    description: &str,
    price: Decimal,
) -> Result<AddOn, AppError> {
    let addon = sqlx::query_as::<_, AddOn>(
        r#"
        INSERT INTO addons (venue_id, name, description, price)
        VALUES ($1, $2, $3, $4)
        RETURNING id, venue_id, name, description, price
        "#,
    )
    .bind(venue_id)
    .bind(name)
    .bind(description)
    .bind(price)
    .fetch_one(pool)
    .await?;

    Ok(addon)
}

pub async fn delete_addon(pool: &PgPool, addon_id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM addons WHERE id = $1")
        .bind(addon_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
