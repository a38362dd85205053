//! Venue catalog route handlers

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, Response},
    routing::{get, post},
    Form, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::db::queries;
use crate::error::{AppError, Result};
use crate::flash::Flash;
use crate::models::venue::{Category, Venue};
use crate::models::ReviewItem;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/venues", get(catalog))
        .route("/venues/:slug", get(detail))
        .route("/venues/:slug/reviews", post(submit_review))
}

/// Query parameters for the catalog listing
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
}

struct VenueCard {
    name: String,
    slug: String,
    city: String,
    price_per_hour: String,
    image_url: String,
}

impl VenueCard {
    fn from_venue(venue: &Venue) -> Self {
        Self {
            name: venue.name.clone(),
            slug: venue.slug.clone(),
            city: venue.city.clone(),
            price_per_hour: venue.price_per_hour.to_string(),
            image_url: venue.image_url.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "venues/list.html")]
struct CatalogTemplate {
    venues: Vec<VenueCard>,
    categories: Vec<Category>,
    has_venues: bool,
}

/// Homepage: a shortlist of venues
async fn home(State(state): State<AppState>) -> Result<Html<String>> {
    let venues = queries::list_venues(&state.db, None, None, None).await?;
    let categories = state.categories().await?;

    let template = CatalogTemplate {
        has_venues: !venues.is_empty(),
        venues: venues.iter().take(6).map(VenueCard::from_venue).collect(),
        categories: (*categories).clone(),
    };
    Ok(Html(template.render()?))
}

/// Filterable venue catalog
async fn catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Html<String>> {
    let venues = queries::list_venues(
        &state.db,
        query.city.as_deref().filter(|c| !c.is_empty()),
        query.category.as_deref().filter(|c| !c.is_empty()),
        query.max_price,
    )
    .await?;
    let categories = state.categories().await?;

    let template = CatalogTemplate {
        has_venues: !venues.is_empty(),
        venues: venues.iter().map(VenueCard::from_venue).collect(),
        categories: (*categories).clone(),
    };
    Ok(Html(template.render()?))
}

struct AddOnRow {
    id: i64,
    name: String,
    price: String,
}

#[derive(Template)]
#[template(path = "venues/detail.html")]
struct VenueDetailTemplate {
    name: String,
    slug: String,
    description: String,
    city: String,
    location: String,
    price_per_hour: String,
    capacity: i32,
    facilities: Vec<String>,
    open_hours: String,
    addons: Vec<AddOnRow>,
    reviews: Vec<ReviewItem>,
    has_addons: bool,
    has_reviews: bool,
}

/// Venue detail page with the booking form, add-ons and reviews.
async fn detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>> {
    let venue = state.venue_by_slug(&slug).await?.ok_or(AppError::NotFound)?;
    let addons = queries::addons_for_venue(&state.db, venue.id).await?;
    let reviews = queries::reviews_for_venue(&state.db, venue.id).await?;

    let open_hours = match (venue.available_start_time, venue.available_end_time) {
        (Some(open), Some(close)) => {
            format!("{} - {}", open.format("%H:%M"), close.format("%H:%M"))
        }
        _ => "Open all day".to_string(),
    };

    let template = VenueDetailTemplate {
        name: venue.name.clone(),
        slug: venue.slug.clone(),
        description: venue.description.clone(),
        city: venue.city.clone(),
        location: venue.location.clone(),
        price_per_hour: venue.price_per_hour.to_string(),
        capacity: venue.capacity,
        facilities: venue.facilities_list(),
        open_hours,
        has_addons: !addons.is_empty(),
        addons: addons
            .iter()
            .map(|a| AddOnRow {
                id: a.id,
                name: a.name.clone(),
                price: a.price.to_string(),
            })
            .collect(),
        has_reviews: !reviews.is_empty(),
        reviews,
    };
    Ok(Html(template.render()?))
}

/// Review submission form
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
}

/// Upsert the caller's review for a venue.
async fn submit_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(slug): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let venue_page = format!("/venues/{slug}");
    let venue = state.venue_by_slug(&slug).await?.ok_or(AppError::NotFound)?;

    if !(1..=5).contains(&form.rating) {
        return Ok(
            Flash::error("Unable to save review. Please check the form.").redirect(&venue_page)
        );
    }

    queries::upsert_review(&state.db, user.id, venue.id, form.rating, &form.comment).await?;
    Ok(Flash::success("Your review has been saved.").redirect(&venue_page))
}

/// Cached venue lookup shared with the booking routes.
impl AppState {
    pub async fn venue_by_slug(&self, slug: &str) -> Result<Option<Venue>> {
        if let Some(cached) = self.cache.venues.get(slug).await {
            tracing::debug!("Cache HIT for venue: {}", slug);
            return Ok(Some((*cached).clone()));
        }

        tracing::debug!("Cache MISS for venue: {}", slug);
        match queries::get_venue_by_slug(&self.db, slug).await? {
            Some(venue) => {
                self.cache
                    .venues
                    .insert(slug.to_string(), Arc::new(venue.clone()))
                    .await;
                Ok(Some(venue))
            }
            None => Ok(None),
        }
    }

    pub async fn categories(&self) -> Result<Arc<Vec<Category>>> {
        if let Some(cached) = self.cache.categories.get("all").await {
            return Ok(cached);
        }

        let categories = Arc::new(queries::list_categories(&self.db).await?);
        self.cache
            .categories
            .insert("all".to_string(), categories.clone())
            .await;
        Ok(categories)
    }
}
