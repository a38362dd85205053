//! Wishlist route handlers

use askama::Template;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::queries;
use crate::error::{AppError, Result};
use crate::flash::Flash;
use crate::models::venue::Venue;
use crate::routes::wants_json;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/wishlist", get(wishlist_page))
        .route("/venues/:id/wishlist", post(toggle))
}

/// Venue payload included in the JSON toggle response
#[derive(Debug, Serialize)]
struct VenuePayload {
    id: i64,
    name: String,
    city: String,
    category: String,
    price: String,
    url: String,
    image: String,
    description: String,
    toggle_url: String,
}

#[derive(Debug, Serialize)]
struct ToggleResponse {
    wishlisted: bool,
    wishlist_count: i64,
    venue: VenuePayload,
    wishlist_item_html: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct NextForm {
    #[serde(default)]
    pub next: Option<String>,
}

/// Wishlist card partial returned to JSON callers so the client can insert
/// the new entry without a reload.
#[derive(Template)]
#[template(path = "partials/wishlist_card.html")]
struct WishlistCardTemplate {
    name: String,
    slug: String,
    city: String,
    price_per_hour: String,
    description: String,
    toggle_url: String,
}

/// Toggle the caller's wishlist entry for a venue.
async fn toggle(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    headers: HeaderMap,
    form: Option<Form<NextForm>>,
) -> Result<Response> {
    let venue = queries::get_venue_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;

    let wishlisted = queries::toggle_wishlist(&state.db, user.id, venue.id).await?;

    if wants_json(&headers) {
        let count = queries::wishlist_count(&state.db, user.id).await?;
        let category = queries::get_category_name(&state.db, venue.category_id).await?;
        let description = truncate_chars(&venue.description, 120);

        let wishlist_item_html = if wishlisted {
            let card = WishlistCardTemplate {
                name: venue.name.clone(),
                slug: venue.slug.clone(),
                city: venue.city.clone(),
                price_per_hour: venue.price_per_hour.to_string(),
                description: description.clone(),
                toggle_url: format!("/venues/{}/wishlist", venue.id),
            };
            Some(card.render()?)
        } else {
            None
        };

        return Ok(Json(ToggleResponse {
            wishlisted,
            wishlist_count: count,
            venue: VenuePayload {
                id: venue.id,
                name: venue.name.clone(),
                city: venue.city.clone(),
                category,
                price: venue.price_per_hour.to_string(),
                url: format!("/venues/{}", venue.slug),
                image: venue.image_url.clone(),
                description,
                toggle_url: format!("/venues/{}/wishlist", venue.id),
            },
            wishlist_item_html,
        })
        .into_response());
    }

    let flash = if wishlisted {
        Flash::success(format!("Added {} to your wishlist.", venue.name))
    } else {
        Flash::info(format!("Removed {} from your wishlist.", venue.name))
    };
    Ok(flash.redirect(&next_url(&headers, form.map(|Form(f)| f).unwrap_or_default())))
}

struct WishlistRow {
    name: String,
    slug: String,
    city: String,
    price_per_hour: String,
}

#[derive(Template)]
#[template(path = "wishlist/list.html")]
struct WishlistTemplate {
    entries: Vec<WishlistRow>,
    has_entries: bool,
}

/// The caller's wishlisted venues.
async fn wishlist_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Html<String>> {
    let venues = queries::wishlist_venues(&state.db, user.id).await?;

    let template = WishlistTemplate {
        has_entries: !venues.is_empty(),
        entries: venues.iter().map(row_from_venue).collect(),
    };
    Ok(Html(template.render()?))
}

fn row_from_venue(venue: &Venue) -> WishlistRow {
    WishlistRow {
        name: venue.name.clone(),
        slug: venue.slug.clone(),
        city: venue.city.clone(),
        price_per_hour: venue.price_per_hour.to_string(),
    }
}

/// Resolve the redirect target for standard callers: a caller-supplied next
/// URL or the referer, validated against the request host to prevent open
/// redirects.
fn next_url(headers: &HeaderMap, form: NextForm) -> String {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let candidate = form.next.or_else(|| {
        headers
            .get(axum::http::header::REFERER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    });

    candidate
        .filter(|c| is_safe_redirect(c, host))
        .unwrap_or_else(|| "/wishlist".to_string())
}

/// Only same-host absolute URLs and absolute paths are allowed.
fn is_safe_redirect(candidate: &str, host: &str) -> bool {
    if candidate.starts_with('/') {
        return !candidate.starts_with("//");
    }
    let rest = candidate
        .strip_prefix("https://")
        .or_else(|| candidate.strip_prefix("http://"));
    match rest {
        Some(rest) if !host.is_empty() => {
            let candidate_host = rest.split(['/', '?', '#']).next().unwrap_or("");
            candidate_host == host
        }
        _ => false,
    }
}

/// Truncate to `limit` characters, appending an ellipsis when shortened.
fn truncate_chars(input: &str, limit: usize) -> String {
    if input.chars().count() <= limit {
        return input.to_string();
    }
    let mut out: String = input.chars().take(limit.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_are_safe() {
        assert!(is_safe_redirect("/venues/skyline-arena", "example.com"));
        assert!(!is_safe_redirect("//evil.com/phish", "example.com"));
    }

    #[test]
    fn absolute_urls_must_match_host() {
        assert!(is_safe_redirect("https://example.com/venues", "example.com"));
        assert!(is_safe_redirect("http://example.com:8000/x", "example.com:8000"));
        assert!(!is_safe_redirect("https://evil.com/venues", "example.com"));
        assert!(!is_safe_redirect("https://example.com.evil.com/", "example.com"));
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert!(!is_safe_redirect("javascript:alert(1)", "example.com"));
        assert!(!is_safe_redirect("ftp://example.com/", "example.com"));
    }

    #[test]
    fn next_url_falls_back_to_wishlist() {
        let headers = HeaderMap::new();
        assert_eq!(next_url(&headers, NextForm::default()), "/wishlist");

        let form = NextForm {
            next: Some("https://evil.com/".to_string()),
        };
        assert_eq!(next_url(&headers, form), "/wishlist");
    }

    #[test]
    fn truncation_appends_ellipsis() {
        assert_eq!(truncate_chars("short", 120), "short");
        let long = "x".repeat(200);
        let truncated = truncate_chars(&long, 120);
        assert_eq!(truncated.chars().count(), 120);
        assert!(truncated.ends_with('…'));
    }
}
