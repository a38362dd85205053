//! User account model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Account row from the users table.
///
/// Registration and login flows are handled outside this service; handlers
/// only resolve the current user from a session row.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}
