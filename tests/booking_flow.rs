//! Database-backed booking lifecycle tests.
//!
//! These exercise the transactional services against a real PostgreSQL
//! instance and are ignored by default; run them with a `DATABASE_URL`
//! pointing at a local server via `cargo test -- --ignored`.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal_macros::dec;
use sqlx::PgPool;

use venuebook_web::booking::models::{BookingStatus, PaymentMethod, PaymentStatus};
use venuebook_web::booking::queries as booking_queries;
use venuebook_web::booking::services::{self, Decision};
use venuebook_web::config::Config;
use venuebook_web::db::queries::{self, VenueInput};
use venuebook_web::error::AppError;
use venuebook_web::models::{User, Venue};

fn config() -> Config {
    Config {
        database_url: String::new(),
        bind_addr: String::new(),
        utc_offset_hours: 7,
        deposit_amount: dec!(10000),
    }
}

fn booking_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

async fn seed_user(pool: &PgPool, username: &str, is_staff: bool) -> User {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password_hash, is_staff)
        VALUES ($1, $2, 'x', $3)
        RETURNING id, username, email, is_staff, created_at
        "#,
    )
    .bind(username)
    .bind(format!("{username}@example.com"))
    .bind(is_staff)
    .fetch_one(pool)
    .await
    .unwrap()
}

// Venue open 07:00-22:00 at 150000/hour, so a single-day booking is 15 hours.
async fn seed_venue(pool: &PgPool) -> Venue {
    let category_id: i64 = sqlx::query_scalar(
        "INSERT INTO categories (name, slug) VALUES ('Futsal', 'futsal') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();

    queries::create_venue(
        pool,
        &VenueInput {
            category_id,
            name: "Skyline Arena".to_string(),
            slug: "skyline-arena".to_string(),
            description: String::new(),
            location: String::new(),
            city: "Metropolis".to_string(),
            address: String::new(),
            price_per_hour: dec!(150000.00),
            capacity: 100,
            facilities: String::new(),
            image_url: String::new(),
            available_start_time: Some(NaiveTime::from_hms_opt(7, 0, 0).unwrap()),
            available_end_time: Some(NaiveTime::from_hms_opt(22, 0, 0).unwrap()),
        },
    )
    .await
    .unwrap()
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn payment_total_tracks_addon_changes(pool: PgPool) {
    let user = seed_user(&pool, "booker", false).await;
    let venue = seed_venue(&pool).await;
    let lighting = queries::insert_addon(&pool, venue.id, "Lighting", "", dec!(50000.00))
        .await
        .unwrap();

    let day = booking_day();
    let booking = services::create_booking(
        &pool,
        &config(),
        &user,
        &venue,
        day,
        day,
        "",
        &[lighting.id],
    )
    .await
    .unwrap();

    // 15 hours at 150000 plus the 50000 add-on.
    let payment = booking_queries::get_payment(&pool, booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.total_amount, dec!(2300000.00));
    assert_eq!(payment.status, PaymentStatus::Waiting);
    assert_eq!(payment.reference_code.len(), 12);

    // Growing the add-on selection and resyncing updates the total in place.
    let sound = queries::insert_addon(&pool, venue.id, "Sound", "", dec!(25000.00))
        .await
        .unwrap();
    let mut tx = pool.begin().await.unwrap();
    booking_queries::set_booking_addons(&mut *tx, booking.id, venue.id, &[sound.id])
        .await
        .unwrap();
    services::resync_payment(&mut tx, &config(), &venue, &booking)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let updated = booking_queries::get_payment(&pool, booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.total_amount, dec!(2325000.00));
    assert_eq!(updated.status, PaymentStatus::Waiting);
    assert_eq!(updated.reference_code, payment.reference_code);
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn cancelling_confirmed_booking_resets_payment(pool: PgPool) {
    let user = seed_user(&pool, "booker", false).await;
    let admin = seed_user(&pool, "admin", true).await;
    let venue = seed_venue(&pool).await;

    let day = booking_day();
    let booking = services::create_booking(&pool, &config(), &user, &venue, day, day, "", &[])
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);

    let approved =
        services::apply_decision(&pool, &config(), &admin, booking.id, Decision::Approve)
            .await
            .unwrap();
    assert_eq!(approved.status, BookingStatus::Active);
    assert_eq!(approved.approved_by, Some(admin.id));
    assert!(approved.approved_at.is_some());

    let paid = services::pay_booking(&pool, &config(), &user, booking.id, PaymentMethod::Qris)
        .await
        .unwrap();
    assert_eq!(paid.status, BookingStatus::Confirmed);
    let payment = booking_queries::get_payment(&pool, booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Confirmed);

    let cancelled = services::cancel_booking(&pool, &config(), &user, booking.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(cancelled.approved_at.is_none());
    assert!(cancelled.approved_by.is_none());

    let reset = booking_queries::get_payment(&pool, booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reset.status, PaymentStatus::Waiting);
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn overlapping_booking_is_rejected(pool: PgPool) {
    let alice = seed_user(&pool, "alice", false).await;
    let bob = seed_user(&pool, "bob", false).await;
    let venue = seed_venue(&pool).await;

    let day = booking_day();
    services::create_booking(&pool, &config(), &alice, &venue, day, day, "", &[])
        .await
        .unwrap();

    let err = services::create_booking(&pool, &config(), &bob, &venue, day, day, "", &[])
        .await
        .unwrap_err();
    match err {
        AppError::Validation(msg) => {
            assert_eq!(msg, "This venue is already booked for the selected dates.")
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The rejected attempt persisted nothing.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE venue_id = $1")
        .bind(venue.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}
