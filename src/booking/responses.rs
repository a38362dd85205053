//! Response DTOs and list projections for booking endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use super::models::{BookingStatus, PaymentStatus};

/// JSON body returned to AJAX cancellation requests.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub success: bool,
    pub message: String,
    pub booking_id: i64,
}

/// Row shown on the user's bookings list.
#[derive(Debug, Clone, FromRow)]
pub struct BookingListItem {
    pub id: i64,
    pub venue_name: String,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub status: BookingStatus,
    pub payment_status: Option<PaymentStatus>,
    pub total_amount: Option<Decimal>,
}

impl BookingListItem {
    pub fn status_label(&self) -> &'static str {
        match self.status {
            BookingStatus::Pending => "Pending approval",
            BookingStatus::Active => "Awaiting payment",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn awaiting_payment(&self) -> bool {
        self.status == BookingStatus::Active
    }
}

/// Row shown on the admin approvals list.
#[derive(Debug, Clone, FromRow)]
pub struct PendingBookingItem {
    pub id: i64,
    pub venue_name: String,
    pub username: String,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub notes: String,
}
