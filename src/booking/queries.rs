//! Database queries for the booking engine.
//!
//! Mutating queries take any Postgres executor so they can run inside the
//! per-request transaction owned by `booking::services`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgExecutor;

use crate::error::AppError;

use super::models::{Booking, BookingStatus, Payment, PaymentMethod, PaymentStatus};
use super::responses::{BookingListItem, PendingBookingItem};
use super::window::BookingWindow;

/// Acquire the per-venue advisory lock for the current transaction.
///
/// Serializes the overlap check and the subsequent insert so two concurrent
/// requests cannot both claim the same slot.
pub async fn lock_venue(exec: impl PgExecutor<'_>, venue_id: i64) -> Result<(), AppError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(venue_id)
        .execute(exec)
        .await?;
    Ok(())
}

/// Half-open overlap test against bookings holding an active status.
pub async fn overlap_exists(
    exec: impl PgExecutor<'_>,
    venue_id: i64,
    window: &BookingWindow,
) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM bookings
            WHERE venue_id = $1
              AND status = ANY($2)
              AND start_datetime < $3
              AND end_datetime > $4
        )
        "#,
    )
    .bind(venue_id)
    .bind(&BookingStatus::ACTIVE_STATUSES[..])
    .bind(window.end)
    .bind(window.start)
    .fetch_one(exec)
    .await?;

    Ok(exists)
}

pub async fn insert_booking(
    exec: impl PgExecutor<'_>,
    user_id: i64,
    venue_id: i64,
    window: &BookingWindow,
    notes: &str,
) -> Result<Booking, AppError> {
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        INSERT INTO bookings (user_id, venue_id, start_datetime, end_datetime, notes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING
            id, user_id, venue_id, start_datetime, end_datetime, notes,
            status, approved_at, approved_by, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(venue_id)
    .bind(window.start)
    .bind(window.end)
    .bind(notes)
    .fetch_one(exec)
    .await?;

    Ok(booking)
}

pub async fn get_booking(
    exec: impl PgExecutor<'_>,
    booking_id: i64,
) -> Result<Option<Booking>, AppError> {
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        SELECT
            id, user_id, venue_id, start_datetime, end_datetime, notes,
            status, approved_at, approved_by, created_at, updated_at
        FROM bookings
        WHERE id = $1
        "#,
    )
    .bind(booking_id)
    .fetch_optional(exec)
    .await?;

    Ok(booking)
}

/// Fetch a booking owned by the given user, locking the row for update.
pub async fn get_booking_for_user(
    exec: impl PgExecutor<'_>,
    booking_id: i64,
    user_id: i64,
) -> Result<Option<Booking>, AppError> {
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        SELECT
            id, user_id, venue_id, start_datetime, end_datetime, notes,
            status, approved_at, approved_by, created_at, updated_at
        FROM bookings
        WHERE id = $1 AND user_id = $2
        FOR UPDATE
        "#,
    )
    .bind(booking_id)
    .bind(user_id)
    .fetch_optional(exec)
    .await?;

    Ok(booking)
}

/// Fetch a booking for an admin decision, locking the row for update.
pub async fn get_booking_for_update(
    exec: impl PgExecutor<'_>,
    booking_id: i64,
) -> Result<Option<Booking>, AppError> {
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        SELECT
            id, user_id, venue_id, start_datetime, end_datetime, notes,
            status, approved_at, approved_by, created_at, updated_at
        FROM bookings
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(booking_id)
    .fetch_optional(exec)
    .await?;

    Ok(booking)
}

/// The user's bookings shown on the bookings list (reserved onward).
pub async fn list_user_bookings(
    exec: impl PgExecutor<'_>,
    user_id: i64,
) -> Result<Vec<BookingListItem>, AppError> {
    let bookings = sqlx::query_as::<_, BookingListItem>(
        r#"
        SELECT
            b.id, v.name AS venue_name, b.start_datetime, b.end_datetime,
            b.status, p.status AS payment_status, p.total_amount
        FROM bookings b
        JOIN venues v ON v.id = b.venue_id
        LEFT JOIN payments p ON p.booking_id = b.id
        WHERE b.user_id = $1
          AND b.status = ANY($2)
        ORDER BY b.start_datetime DESC
        "#,
    )
    .bind(user_id)
    .bind(
        &[
            BookingStatus::Active,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
        ][..],
    )
    .fetch_all(exec)
    .await?;

    Ok(bookings)
}

/// Pending bookings awaiting an admin decision, soonest first.
pub async fn list_pending_bookings(
    exec: impl PgExecutor<'_>,
) -> Result<Vec<PendingBookingItem>, AppError> {
    let bookings = sqlx::query_as::<_, PendingBookingItem>(
        r#"
        SELECT
            b.id, v.name AS venue_name, u.username, b.start_datetime,
            b.end_datetime, b.notes
        FROM bookings b
        JOIN venues v ON v.id = b.venue_id
        JOIN users u ON u.id = b.user_id
        WHERE b.status = $1
        ORDER BY b.start_datetime ASC
        "#,
    )
    .bind(BookingStatus::Pending)
    .fetch_all(exec)
    .await?;

    Ok(bookings)
}

/// Replace the booking's add-on selection, restricted to the venue's own
/// add-ons. Returns how many selections were persisted.
pub async fn set_booking_addons(
    exec: impl PgExecutor<'_>,
    booking_id: i64,
    venue_id: i64,
    addon_ids: &[i64],
) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO booking_addons (booking_id, addon_id)
        SELECT $1, id
        FROM addons
        WHERE venue_id = $2 AND id = ANY($3)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(booking_id)
    .bind(venue_id)
    .bind(addon_ids)
    .execute(exec)
    .await?;

    Ok(result.rows_affected())
}

/// Sum of the booking's selected add-on prices.
pub async fn addon_total(
    exec: impl PgExecutor<'_>,
    booking_id: i64,
) -> Result<Decimal, AppError> {
    let total = sqlx::query_scalar::<_, Option<Decimal>>(
        r#"
        SELECT SUM(a.price)
        FROM booking_addons ba
        JOIN addons a ON a.id = ba.addon_id
        WHERE ba.booking_id = $1
        "#,
    )
    .bind(booking_id)
    .fetch_one(exec)
    .await?;

    Ok(total.unwrap_or(Decimal::ZERO))
}

/// Prices of the given add-ons belonging to the venue. Selections pointing at
/// another venue's add-ons are silently dropped by the venue filter.
pub async fn addon_prices(
    exec: impl PgExecutor<'_>,
    venue_id: i64,
    addon_ids: &[i64],
) -> Result<Vec<Decimal>, AppError> {
    let prices = sqlx::query_scalar::<_, Decimal>(
        r#"
        SELECT price
        FROM addons
        WHERE venue_id = $1 AND id = ANY($2)
        "#,
    )
    .bind(venue_id)
    .bind(addon_ids)
    .fetch_all(exec)
    .await?;

    Ok(prices)
}

pub async fn get_payment(
    exec: impl PgExecutor<'_>,
    booking_id: i64,
) -> Result<Option<Payment>, AppError> {
    let payment = sqlx::query_as::<_, Payment>(
        r#"
        SELECT
            id, booking_id, method, status, total_amount, deposit_amount,
            reference_code, created_at, updated_at
        FROM payments
        WHERE booking_id = $1
        "#,
    )
    .bind(booking_id)
    .fetch_optional(exec)
    .await?;

    Ok(payment)
}

pub async fn insert_payment(
    exec: impl PgExecutor<'_>,
    booking_id: i64,
    total_amount: Decimal,
    deposit_amount: Decimal,
    reference_code: &str,
) -> Result<Payment, AppError> {
    sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (booking_id, method, status, total_amount, deposit_amount, reference_code)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING
            id, booking_id, method, status, total_amount, deposit_amount,
            reference_code, created_at, updated_at
        "#,
    )
    .bind(booking_id)
    .bind(PaymentMethod::Qris)
    .bind(PaymentStatus::Waiting)
    .bind(total_amount)
    .bind(deposit_amount)
    .bind(reference_code)
    .fetch_one(exec)
    .await
    .map_err(|e| AppError::from_unique_violation(e, "Payment reference code already in use."))
}

pub async fn update_payment_total(
    exec: impl PgExecutor<'_>,
    payment_id: i64,
    total_amount: Decimal,
) -> Result<(), AppError> {
    sqlx::query("UPDATE payments SET total_amount = $2, updated_at = now() WHERE id = $1")
        .bind(payment_id)
        .bind(total_amount)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn update_payment_status(
    exec: impl PgExecutor<'_>,
    booking_id: i64,
    status: PaymentStatus,
) -> Result<(), AppError> {
    sqlx::query("UPDATE payments SET status = $2, updated_at = now() WHERE booking_id = $1")
        .bind(booking_id)
        .bind(status)
        .execute(exec)
        .await?;
    Ok(())
}

/// Record the chosen method alongside the settlement status on payment
/// confirmation.
pub async fn confirm_payment(
    exec: impl PgExecutor<'_>,
    booking_id: i64,
    method: PaymentMethod,
) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE payments SET method = $2, status = $3, updated_at = now() WHERE booking_id = $1",
    )
    .bind(booking_id)
    .bind(method)
    .bind(PaymentStatus::Confirmed)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn set_booking_status(
    exec: impl PgExecutor<'_>,
    booking_id: i64,
    status: BookingStatus,
) -> Result<(), AppError> {
    sqlx::query("UPDATE bookings SET status = $2, updated_at = now() WHERE id = $1")
        .bind(booking_id)
        .bind(status)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn approve_booking_row(
    exec: impl PgExecutor<'_>,
    booking_id: i64,
    admin_id: i64,
    approved_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE bookings
        SET status = $2, approved_at = $3, approved_by = $4, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(booking_id)
    .bind(BookingStatus::Active)
    .bind(approved_at)
    .bind(admin_id)
    .execute(exec)
    .await?;
    Ok(())
}

/// Cancel the booking and clear approval metadata.
pub async fn cancel_booking_row(
    exec: impl PgExecutor<'_>,
    booking_id: i64,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE bookings
        SET status = $2, approved_at = NULL, approved_by = NULL, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(booking_id)
    .bind(BookingStatus::Cancelled)
    .execute(exec)
    .await?;
    Ok(())
}
