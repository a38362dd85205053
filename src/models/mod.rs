//! Database models shared across route handlers

pub mod user;
pub mod venue;
pub mod wishlist;

pub use user::User;
pub use venue::{AddOn, Category, Venue};
pub use wishlist::ReviewItem;
