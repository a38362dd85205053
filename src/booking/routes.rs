//! Booking, payment and approval route handlers

use askama::Template;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};

use crate::auth::{require_staff, AuthUser};
use crate::error::{AppError, Result};
use crate::flash::Flash;
use crate::routes::wants_json;
use crate::AppState;

use super::models::BookingStatus;
use super::queries;
use super::requests::{BookingForm, DecisionForm, PaymentForm};
use super::responses::CancelResponse;
use super::services::{self, Decision};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/venues/:slug/book", post(submit_booking))
        .route("/bookings", get(booked_places))
        .route("/bookings/:id/cancel", post(cancel_booking))
        .route("/bookings/:id/payment", get(payment_form).post(submit_payment))
        .route("/manage/bookings", get(approvals).post(submit_decision))
}

/// Submit a booking request for a venue.
async fn submit_booking(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(slug): Path<String>,
    Form(form): Form<BookingForm>,
) -> Result<Response> {
    let venue_page = format!("/venues/{slug}");
    let venue = state.venue_by_slug(&slug).await?.ok_or(AppError::NotFound)?;

    if user.is_staff {
        return Ok(Flash::error(
            "Administrators cannot create bookings. Please use a regular user account.",
        )
        .redirect(&venue_page));
    }

    let outcome = match form.addon_ids() {
        Ok(addon_ids) => {
            services::create_booking(
                &state.db,
                &state.config,
                &user,
                &venue,
                form.start_date,
                form.end_date,
                &form.notes,
                &addon_ids,
            )
            .await
        }
        Err(err) => Err(err),
    };

    match outcome {
        Ok(_) => Ok(Flash::success(
            "Your booking request was submitted and is awaiting admin approval.",
        )
        .redirect("/bookings")),
        Err(AppError::Validation(reason)) => {
            tracing::debug!(%slug, %reason, "booking request rejected");
            Ok(Flash::error(
                "Unable to create booking. Please check availability details.",
            )
            .redirect(&venue_page))
        }
        Err(err) => Err(err),
    }
}

struct BookingRow {
    id: i64,
    venue_name: String,
    window: String,
    status_label: &'static str,
    awaiting_payment: bool,
    total_amount: String,
}

#[derive(Template)]
#[template(path = "bookings/list.html")]
struct BookedPlacesTemplate {
    bookings: Vec<BookingRow>,
    has_bookings: bool,
}

/// Display all bookings made by the current user.
async fn booked_places(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Html<String>> {
    let items = queries::list_user_bookings(&state.db, user.id).await?;
    let tz = state.config.timezone();

    let bookings: Vec<BookingRow> = items
        .into_iter()
        .map(|item| BookingRow {
            id: item.id,
            venue_name: item.venue_name.clone(),
            window: format!(
                "{} - {}",
                item.start_datetime.with_timezone(&tz).format("%Y-%m-%d %H:%M"),
                item.end_datetime.with_timezone(&tz).format("%Y-%m-%d %H:%M"),
            ),
            status_label: item.status_label(),
            awaiting_payment: item.awaiting_payment(),
            total_amount: item
                .total_amount
                .map(|a| a.to_string())
                .unwrap_or_default(),
        })
        .collect();

    let template = BookedPlacesTemplate {
        has_bookings: !bookings.is_empty(),
        bookings,
    };
    Ok(Html(template.render()?))
}

/// Cancel the caller's booking. AJAX requests get a JSON verdict, standard
/// requests a flash redirect.
async fn cancel_booking(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Response> {
    let json = wants_json(&headers);

    match services::cancel_booking(&state.db, &state.config, &user, id).await {
        Ok(booking) => {
            let message = "Booking cancelled successfully.";
            if json {
                Ok(Json(CancelResponse {
                    success: true,
                    message: message.to_string(),
                    booking_id: booking.id,
                })
                .into_response())
            } else {
                Ok(Flash::success(message).redirect("/bookings"))
            }
        }
        Err(AppError::StateConflict(message)) => {
            if json {
                Ok((
                    StatusCode::BAD_REQUEST,
                    Json(CancelResponse {
                        success: false,
                        message,
                        booking_id: id,
                    }),
                )
                    .into_response())
            } else {
                Ok(Flash::error(message).redirect("/bookings"))
            }
        }
        Err(err) => Err(err),
    }
}

#[derive(Template)]
#[template(path = "bookings/payment.html")]
struct PaymentTemplate {
    booking_id: i64,
    status_label: &'static str,
    total_amount: String,
    deposit_amount: String,
    reference_code: String,
}

/// The payment screen is gated by booking status: pending bookings wait for
/// approval, terminal bookings are closed.
fn payment_gate(status: BookingStatus) -> Option<Response> {
    match status {
        BookingStatus::Pending => Some(
            Flash::error("This booking still requires admin approval before payment.")
                .redirect("/wishlist"),
        ),
        BookingStatus::Cancelled | BookingStatus::Completed => {
            Some(Flash::error("This booking can no longer be paid.").redirect("/bookings"))
        }
        BookingStatus::Active | BookingStatus::Confirmed => None,
    }
}

async fn payment_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    let (booking, payment) =
        services::booking_with_payment(&state.db, &state.config, &user, id).await?;
    if let Some(redirect) = payment_gate(booking.status) {
        return Ok(redirect);
    }

    let template = PaymentTemplate {
        booking_id: booking.id,
        status_label: match booking.status {
            BookingStatus::Confirmed => "Confirmed",
            _ => "Awaiting payment",
        },
        total_amount: payment.total_amount.to_string(),
        deposit_amount: payment.deposit_amount.to_string(),
        reference_code: payment.reference_code,
    };
    Ok(Html(template.render()?).into_response())
}

async fn submit_payment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Form(form): Form<PaymentForm>,
) -> Result<Response> {
    let (booking, _) =
        services::booking_with_payment(&state.db, &state.config, &user, id).await?;
    if let Some(redirect) = payment_gate(booking.status) {
        return Ok(redirect);
    }

    let method = match form.parse_method() {
        Ok(method) => method,
        Err(_) => {
            return Ok(Flash::error("Could not process the payment. Please try again.")
                .redirect(&format!("/bookings/{id}/payment")));
        }
    };

    services::pay_booking(&state.db, &state.config, &user, id, method).await?;
    Ok(Flash::success("Payment completed! Your booking is confirmed.").redirect("/bookings"))
}

struct PendingRow {
    id: i64,
    venue_name: String,
    username: String,
    window: String,
    notes: String,
}

#[derive(Template)]
#[template(path = "admin/approvals.html")]
struct ApprovalsTemplate {
    pending: Vec<PendingRow>,
    has_pending: bool,
}

/// Admin approvals list.
async fn approvals(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Html<String>> {
    require_staff(&user)?;

    let items = queries::list_pending_bookings(&state.db).await?;
    let tz = state.config.timezone();
    let pending: Vec<PendingRow> = items
        .into_iter()
        .map(|item| PendingRow {
            id: item.id,
            venue_name: item.venue_name,
            username: item.username,
            window: format!(
                "{} - {}",
                item.start_datetime.with_timezone(&tz).format("%Y-%m-%d %H:%M"),
                item.end_datetime.with_timezone(&tz).format("%Y-%m-%d %H:%M"),
            ),
            notes: item.notes,
        })
        .collect();

    let template = ApprovalsTemplate {
        has_pending: !pending.is_empty(),
        pending,
    };
    Ok(Html(template.render()?))
}

/// Apply an approve/cancel decision to a pending booking.
async fn submit_decision(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<DecisionForm>,
) -> Result<Response> {
    require_staff(&user)?;

    let decision: Decision = match form.decision.parse() {
        Ok(decision) => decision,
        Err(AppError::Validation(msg)) => {
            return Ok(Flash::error(msg).redirect("/manage/bookings"));
        }
        Err(err) => return Err(err),
    };

    match services::apply_decision(&state.db, &state.config, &user, form.booking_id, decision)
        .await
    {
        Ok(_) => {
            let message = match decision {
                Decision::Approve => "Booking approved successfully.",
                Decision::Cancel => "Booking request cancelled.",
            };
            Ok(Flash::success(message).redirect("/manage/bookings"))
        }
        Err(AppError::NotFound) => {
            Ok(Flash::error("Booking not found.").redirect("/manage/bookings"))
        }
        Err(AppError::StateConflict(msg)) => Ok(Flash::error(msg).redirect("/manage/bookings")),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_gate_routing() {
        assert!(payment_gate(BookingStatus::Active).is_none());
        assert!(payment_gate(BookingStatus::Confirmed).is_none());
        assert!(payment_gate(BookingStatus::Pending).is_some());
        assert!(payment_gate(BookingStatus::Cancelled).is_some());
        assert!(payment_gate(BookingStatus::Completed).is_some());
    }
}
