//! Admin venue and add-on management

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::auth::{require_staff, AuthUser};
use crate::db::queries::{self, VenueInput};
use crate::error::{AppError, Result};
use crate::flash::Flash;
use crate::models::venue::Category;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/manage/venues", get(venue_list).post(create_venue))
        .route("/manage/venues/:id", post(update_venue))
        .route("/manage/venues/:id/delete", post(delete_venue))
        .route("/manage/venues/:id/addons", post(create_addon))
        .route("/manage/addons/:id/delete", post(delete_addon))
}

struct VenueAdminRow {
    id: i64,
    name: String,
    slug: String,
    city: String,
    price_per_hour: String,
    capacity: i32,
}

#[derive(Template)]
#[template(path = "admin/venues.html")]
struct VenueAdminTemplate {
    venues: Vec<VenueAdminRow>,
    categories: Vec<Category>,
    has_venues: bool,
}

async fn venue_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Html<String>> {
    require_staff(&user)?;

    let venues = queries::list_venues(&state.db, None, None, None).await?;
    let categories = state.categories().await?;

    let template = VenueAdminTemplate {
        has_venues: !venues.is_empty(),
        venues: venues
            .iter()
            .map(|v| VenueAdminRow {
                id: v.id,
                name: v.name.clone(),
                slug: v.slug.clone(),
                city: v.city.clone(),
                price_per_hour: v.price_per_hour.to_string(),
                capacity: v.capacity,
            })
            .collect(),
        categories: (*categories).clone(),
    };
    Ok(Html(template.render()?))
}

/// Admin venue form. Slug is derived from the name when omitted, opening
/// hours accept `HH:MM` or `HH:MM:SS` and may be left blank for venues that
/// never close.
#[derive(Debug, Deserialize)]
pub struct VenueForm {
    pub category_id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub city: String,
    #[serde(default)]
    pub address: String,
    pub price_per_hour: Decimal,
    pub capacity: i32,
    #[serde(default)]
    pub facilities: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub available_start_time: String,
    #[serde(default)]
    pub available_end_time: String,
}

impl VenueForm {
    fn into_input(self) -> Result<VenueInput> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Venue name is required.".to_string()));
        }
        if self.price_per_hour <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Price per hour must be greater than zero.".to_string(),
            ));
        }
        if self.capacity <= 0 {
            return Err(AppError::Validation(
                "Capacity must be greater than zero.".to_string(),
            ));
        }

        let slug = if self.slug.trim().is_empty() {
            slugify(&self.name)
        } else {
            slugify(&self.slug)
        };
        if slug.is_empty() {
            return Err(AppError::Validation(
                "Could not derive a slug from the venue name.".to_string(),
            ));
        }

        Ok(VenueInput {
            category_id: self.category_id,
            name: self.name.trim().to_string(),
            slug,
            description: self.description,
            location: self.location,
            city: self.city.trim().to_string(),
            address: self.address,
            price_per_hour: self.price_per_hour,
            capacity: self.capacity,
            facilities: self.facilities,
            image_url: self.image_url,
            available_start_time: parse_time(&self.available_start_time)?,
            available_end_time: parse_time(&self.available_end_time)?,
        })
    }
}

async fn create_venue(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<VenueForm>,
) -> Result<Response> {
    require_staff(&user)?;

    match try_create(&state, form).await {
        Ok(venue) => {
            Ok(Flash::success(format!("Venue {} created.", venue.name))
                .redirect("/manage/venues"))
        }
        Err(AppError::Validation(msg)) => Ok(Flash::error(msg).redirect("/manage/venues")),
        Err(err) => Err(err),
    }
}

async fn try_create(state: &AppState, form: VenueForm) -> Result<crate::models::venue::Venue> {
    let input = form.into_input()?;
    let venue = queries::create_venue(&state.db, &input).await?;
    state.cache.invalidate_catalog();
    tracing::info!(venue_id = venue.id, slug = %venue.slug, "venue created");
    Ok(venue)
}

async fn update_venue(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Form(form): Form<VenueForm>,
) -> Result<Response> {
    require_staff(&user)?;

    match try_update(&state, id, form).await {
        Ok(venue) => {
            Ok(Flash::success(format!("Venue {} updated.", venue.name))
                .redirect("/manage/venues"))
        }
        Err(AppError::Validation(msg)) => Ok(Flash::error(msg).redirect("/manage/venues")),
        Err(AppError::NotFound) => {
            Ok(Flash::error("Venue not found.").redirect("/manage/venues"))
        }
        Err(err) => Err(err),
    }
}

async fn try_update(
    state: &AppState,
    id: i64,
    form: VenueForm,
) -> Result<crate::models::venue::Venue> {
    let input = form.into_input()?;
    let venue = queries::update_venue(&state.db, id, &input).await?;
    state.cache.invalidate_catalog();
    tracing::info!(venue_id = venue.id, slug = %venue.slug, "venue updated");
    Ok(venue)
}

async fn delete_venue(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    require_staff(&user)?;

    match queries::delete_venue(&state.db, id).await {
        Ok(()) => {
            state.cache.invalidate_catalog();
            tracing::info!(venue_id = id, "venue deleted");
            Ok(Flash::success("Venue deleted.").redirect("/manage/venues"))
        }
        Err(AppError::NotFound) => {
            Ok(Flash::error("Venue not found.").redirect("/manage/venues"))
        }
        Err(err) => Err(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct AddOnForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
}

async fn create_addon(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(venue_id): Path<i64>,
    Form(form): Form<AddOnForm>,
) -> Result<Response> {
    require_staff(&user)?;

    let venue = queries::get_venue_by_id(&state.db, venue_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if form.name.trim().is_empty() || form.price < Decimal::ZERO {
        return Ok(
            Flash::error("Unable to save add-on. Please check the form.")
                .redirect("/manage/venues"),
        );
    }

    queries::insert_addon(&state.db, venue.id, form.name.trim(), &form.description, form.price)
        .await?;
    Ok(Flash::success(format!("Add-on added to {}.", venue.name)).redirect("/manage/venues"))
}

async fn delete_addon(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    require_staff(&user)?;

    match queries::delete_addon(&state.db, id).await {
        Ok(()) => Ok(Flash::success("Add-on deleted.").redirect("/manage/venues")),
        Err(AppError::NotFound) => {
            Ok(Flash::error("Add-on not found.").redirect("/manage/venues"))
        }
        Err(err) => Err(err),
    }
}

/// Lowercase, alphanumeric words joined by single hyphens.
fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_hyphen = true;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Parse an opening-hours field. Blank means no restriction.
fn parse_time(input: &str) -> Result<Option<NaiveTime>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map(Some)
        .map_err(|_| {
            AppError::Validation(format!("Invalid time value: {trimmed}. Use HH:MM."))
        })
}
