//! Booking service functions with database access.
//!
//! Every operation that mutates a booking runs as one transaction: the
//! booking row, its add-on selection and its payment record change together
//! or not at all. Payment synchronization is invoked explicitly from these
//! functions rather than through implicit save hooks, so the data flow stays
//! traceable.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{User, Venue};

use super::models::{Booking, Payment, PaymentMethod, PaymentStatus};
use super::queries;
use super::window::{self, BookingWindow};

/// Admin decision on a pending booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Cancel,
}

impl std::str::FromStr for Decision {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approve" => Ok(Decision::Approve),
            "cancel" => Ok(Decision::Cancel),
            other => Err(AppError::Validation(format!(
                "Unknown booking decision: {other}"
            ))),
        }
    }
}

/// Opaque unique identifier assigned to a payment at creation.
pub fn generate_reference_code() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_uppercase()
}

/// Validate the requested window and create a pending booking.
///
/// Holds the venue advisory lock across the overlap check and the insert, so
/// concurrent requests for the same slot serialize. The payment record is
/// created in the same transaction.
pub async fn create_booking(
    pool: &PgPool,
    config: &Config,
    user: &User,
    venue: &Venue,
    start_date: chrono::NaiveDate,
    end_date: chrono::NaiveDate,
    notes: &str,
    addon_ids: &[i64],
) -> Result<Booking> {
    let window = window::compute_window(venue, start_date, end_date, config.timezone())?;

    let mut tx = pool.begin().await?;
    queries::lock_venue(&mut *tx, venue.id).await?;

    if queries::overlap_exists(&mut *tx, venue.id, &window).await? {
        return Err(AppError::Validation(
            "This venue is already booked for the selected dates.".to_string(),
        ));
    }

    let booking = queries::insert_booking(&mut *tx, user.id, venue.id, &window, notes).await?;
    if !addon_ids.is_empty() {
        queries::set_booking_addons(&mut *tx, booking.id, venue.id, addon_ids).await?;
    }

    let prices = queries::addon_prices(&mut *tx, venue.id, addon_ids).await?;
    let total = window::total_cost(venue, &window, &prices);
    ensure_payment(&mut tx, booking.id, total, config.deposit_amount).await?;

    tx.commit().await?;

    tracing::info!(
        booking_id = booking.id,
        venue_id = venue.id,
        user_id = user.id,
        "booking request created"
    );
    Ok(booking)
}

/// Current total cost of the booking: base hourly cost plus selected add-ons.
async fn booking_total(
    conn: &mut PgConnection,
    venue: &Venue,
    window: &BookingWindow,
    booking_id: i64,
) -> Result<Decimal> {
    let addons = queries::addon_total(&mut *conn, booking_id).await?;
    Ok(venue.hourly_total(window.duration_hours()) + addons)
}

/// Ensure a payment record exists for the booking and that its total matches
/// the booking's current cost.
///
/// Creates the payment lazily with default method, `waiting` status, the
/// fixed deposit and a fresh reference code. An existing payment with a stale
/// total is updated in place; its status and reference code stay untouched.
pub async fn ensure_payment(
    conn: &mut PgConnection,
    booking_id: i64,
    total_cost: Decimal,
    deposit_amount: Decimal,
) -> Result<Payment> {
    match queries::get_payment(&mut *conn, booking_id).await? {
        Some(payment) => {
            if payment.total_amount != total_cost {
                queries::update_payment_total(&mut *conn, payment.id, total_cost).await?;
                return Ok(Payment {
                    total_amount: total_cost,
                    ..payment
                });
            }
            Ok(payment)
        }
        None => {
            let reference = generate_reference_code();
            queries::insert_payment(&mut *conn, booking_id, total_cost, deposit_amount, &reference)
                .await
        }
    }
}

/// Recompute the booking's total from the database and resynchronize its
/// payment. Called after any change to cost-affecting fields.
pub async fn resync_payment(
    conn: &mut PgConnection,
    config: &Config,
    venue: &Venue,
    booking: &Booking,
) -> Result<Payment> {
    let window = BookingWindow {
        start: booking.start_datetime,
        end: booking.end_datetime,
    };
    let total = booking_total(conn, venue, &window, booking.id).await?;
    ensure_payment(conn, booking.id, total, config.deposit_amount).await
}

/// Apply an admin decision to a pending booking.
///
/// Approval sets the booking active and stamps the approval metadata; a
/// cancel decision releases the slot. Either way the payment ends up in
/// `waiting`. A decision against a non-pending booking is rejected without
/// side effects.
pub async fn apply_decision(
    pool: &PgPool,
    config: &Config,
    admin: &User,
    booking_id: i64,
    decision: Decision,
) -> Result<Booking> {
    let mut tx = pool.begin().await?;

    let booking = queries::get_booking_for_update(&mut *tx, booking_id)
        .await?
        .ok_or(AppError::NotFound)?;
    booking.check_decidable()?;

    let venue = crate::db::queries::get_venue_by_id(&mut *tx, booking.venue_id)
        .await?
        .ok_or(AppError::NotFound)?;

    match decision {
        Decision::Approve => {
            queries::approve_booking_row(&mut *tx, booking.id, admin.id, Utc::now()).await?;
        }
        Decision::Cancel => {
            queries::cancel_booking_row(&mut *tx, booking.id).await?;
        }
    }

    let payment = resync_payment(&mut tx, config, &venue, &booking).await?;
    if payment.status != PaymentStatus::Waiting {
        queries::update_payment_status(&mut *tx, booking.id, PaymentStatus::Waiting).await?;
    }

    let updated = queries::get_booking(&mut *tx, booking.id)
        .await?
        .ok_or(AppError::NotFound)?;
    tx.commit().await?;

    tracing::info!(
        booking_id = booking.id,
        admin = %admin.username,
        ?decision,
        "booking decision applied"
    );
    Ok(updated)
}

/// Cancel a booking on behalf of its owner.
///
/// Rejected for terminal bookings. Clears approval metadata and resets the
/// payment to `waiting` so the slot becomes bookable again and the payment is
/// no longer considered settled.
pub async fn cancel_booking(
    pool: &PgPool,
    config: &Config,
    user: &User,
    booking_id: i64,
) -> Result<Booking> {
    let mut tx = pool.begin().await?;

    let booking = queries::get_booking_for_user(&mut *tx, booking_id, user.id)
        .await?
        .ok_or(AppError::NotFound)?;
    booking.check_cancellable()?;

    let venue = crate::db::queries::get_venue_by_id(&mut *tx, booking.venue_id)
        .await?
        .ok_or(AppError::NotFound)?;

    queries::cancel_booking_row(&mut *tx, booking.id).await?;

    // Keep a payment record around so the user can book again later.
    resync_payment(&mut tx, config, &venue, &booking).await?;
    queries::update_payment_status(&mut *tx, booking.id, PaymentStatus::Waiting).await?;

    let updated = queries::get_booking(&mut *tx, booking.id)
        .await?
        .ok_or(AppError::NotFound)?;
    tx.commit().await?;

    tracing::info!(booking_id = booking.id, user_id = user.id, "booking cancelled");
    Ok(updated)
}

/// Load a booking for the payment screen, ensuring its payment exists and is
/// up to date.
pub async fn booking_with_payment(
    pool: &PgPool,
    config: &Config,
    user: &User,
    booking_id: i64,
) -> Result<(Booking, Payment)> {
    let mut tx = pool.begin().await?;

    let booking = queries::get_booking_for_user(&mut *tx, booking_id, user.id)
        .await?
        .ok_or(AppError::NotFound)?;
    let venue = crate::db::queries::get_venue_by_id(&mut *tx, booking.venue_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let payment = resync_payment(&mut tx, config, &venue, &booking).await?;
    tx.commit().await?;

    Ok((booking, payment))
}

/// Finalize payment for an approved booking.
///
/// Only `active` bookings are payable: pending ones must wait for approval,
/// terminal ones are closed. Confirms the payment with the chosen method and
/// moves the booking to `confirmed` in the same transaction.
pub async fn pay_booking(
    pool: &PgPool,
    config: &Config,
    user: &User,
    booking_id: i64,
    method: PaymentMethod,
) -> Result<Booking> {
    let mut tx = pool.begin().await?;

    let booking = queries::get_booking_for_user(&mut *tx, booking_id, user.id)
        .await?
        .ok_or(AppError::NotFound)?;
    booking.check_payable()?;

    let venue = crate::db::queries::get_venue_by_id(&mut *tx, booking.venue_id)
        .await?
        .ok_or(AppError::NotFound)?;

    resync_payment(&mut tx, config, &venue, &booking).await?;
    queries::confirm_payment(&mut *tx, booking.id, method).await?;
    queries::set_booking_status(&mut *tx, booking.id, super::models::BookingStatus::Confirmed)
        .await?;

    let updated = queries::get_booking(&mut *tx, booking.id)
        .await?
        .ok_or(AppError::NotFound)?;
    tx.commit().await?;

    tracing::info!(booking_id = booking.id, ?method, "payment confirmed");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_codes_are_short_unique_and_uppercase() {
        let a = generate_reference_code();
        let b = generate_reference_code();
        assert_eq!(a.len(), 12);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn decision_parses_known_values_only() {
        assert_eq!("approve".parse::<Decision>().unwrap(), Decision::Approve);
        assert_eq!("cancel".parse::<Decision>().unwrap(), Decision::Cancel);
        assert!("reject".parse::<Decision>().is_err());
    }
}
