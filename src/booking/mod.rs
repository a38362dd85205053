//! Booking engine module.
//!
//! Validates requested time windows against venue hours and existing
//! bookings, keeps the one-to-one payment record in sync with booking cost,
//! and drives the admin approval state machine.

pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;
pub mod window;

// Re-export commonly used items
pub use models::{Booking, BookingStatus, Payment, PaymentMethod, PaymentStatus};
pub use routes::router;
pub use window::{compute_window, windows_overlap, BookingWindow};
