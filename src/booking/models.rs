//! Booking and payment models.
//!
//! These models use sqlx's FromRow derive for direct database
//! deserialization; status enums map onto the Postgres enum types created in
//! the initial migration.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Booking lifecycle status.
///
/// `pending`, `active` and `confirmed` all reserve the venue slot for overlap
/// purposes; `completed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Active,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Statuses that hold a venue slot against double-booking.
    pub const ACTIVE_STATUSES: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Active,
        BookingStatus::Confirmed,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

/// Payment settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Waiting,
    Confirmed,
    Completed,
}

/// Supported payment methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Qris,
    Gopay,
}

/// A user's booking of a venue time window
#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub venue_id: i64,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub notes: String,
    pub status: BookingStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Window length floor-divided to whole hours.
    pub fn duration_hours(&self) -> i64 {
        (self.end_datetime - self.start_datetime).num_seconds() / 3600
    }

    /// Guard for user/admin cancellation. Terminal bookings stay untouched.
    pub fn check_cancellable(&self) -> Result<(), crate::error::AppError> {
        if self.status.is_terminal() {
            return Err(crate::error::AppError::StateConflict(
                "This booking can no longer be cancelled.".to_string(),
            ));
        }
        Ok(())
    }

    /// Guard for an admin approve/cancel decision. Only pending bookings may
    /// receive a decision; resubmission is rejected explicitly.
    pub fn check_decidable(&self) -> Result<(), crate::error::AppError> {
        if self.status != BookingStatus::Pending {
            return Err(crate::error::AppError::StateConflict(
                "This booking has already been processed.".to_string(),
            ));
        }
        Ok(())
    }

    /// Guard for the payment flow. Payment requires a prior admin approval
    /// and is closed once the booking reaches a terminal state.
    pub fn check_payable(&self) -> Result<(), crate::error::AppError> {
        match self.status {
            BookingStatus::Pending => Err(crate::error::AppError::StateConflict(
                "This booking still requires admin approval before payment.".to_string(),
            )),
            BookingStatus::Cancelled | BookingStatus::Completed => {
                Err(crate::error::AppError::StateConflict(
                    "This booking can no longer be paid.".to_string(),
                ))
            }
            BookingStatus::Active | BookingStatus::Confirmed => Ok(()),
        }
    }
}

/// Payment record, one-to-one with a booking
#[derive(Debug, Clone, FromRow)]
pub struct Payment {
    pub id: i64,
    pub booking_id: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub total_amount: Decimal,
    pub deposit_amount: Decimal,
    pub reference_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
