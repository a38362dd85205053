//! Session-backed authentication and capability checks.
//!
//! Login and registration are handled elsewhere; this module only resolves
//! the current user from a session cookie and gates admin-only handlers with
//! an explicit capability check.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::models::User;
use crate::AppState;

pub const SESSION_COOKIE: &str = "vb_session";

/// The authenticated user extracted from the session cookie.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|cookies| session_token(cookies, SESSION_COOKIE))
            .ok_or_else(|| AppError::Forbidden("Please sign in first.".to_string()))?;

        let user = crate::db::queries::get_session_user(&state.db, &token)
            .await?
            .ok_or_else(|| AppError::Forbidden("Your session has expired.".to_string()))?;

        Ok(AuthUser(user))
    }
}

/// Explicit capability check invoked at the start of admin handlers.
pub fn require_staff(user: &User) -> Result<(), AppError> {
    if user.is_staff {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not have permission to perform this action.".to_string(),
        ))
    }
}

/// Pull a named cookie value out of a Cookie header.
fn session_token(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(is_staff: bool) -> User {
        User {
            id: 1,
            username: "booker".to_string(),
            email: "booker@example.com".to_string(),
            is_staff,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn session_token_parses_cookie_header() {
        let header = "theme=dark; vb_session=abc123; other=1";
        assert_eq!(session_token(header, "vb_session").as_deref(), Some("abc123"));
        assert_eq!(session_token("theme=dark", "vb_session"), None);
        assert_eq!(session_token("", "vb_session"), None);
    }

    #[test]
    fn staff_capability_check() {
        assert!(require_staff(&user(true)).is_ok());
        assert!(matches!(
            require_staff(&user(false)),
            Err(AppError::Forbidden(_))
        ));
    }
}
