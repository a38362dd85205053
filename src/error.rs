//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    StateConflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Convert unique-constraint violations into field-level validation errors.
    ///
    /// Persistence races (duplicate venue slug, duplicate payment reference
    /// code) must surface as recoverable form errors, not raw 500s.
    pub fn from_unique_violation(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return AppError::Validation(message.to_string());
            }
        }
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Page not found".to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::StateConflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Template(e) => {
                tracing::error!("Template error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        // Return simple HTML error page
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head><title>{} - VenueBook</title></head>
<body style="font-family: sans-serif; text-align: center; padding: 50px;">
    <h1>{}</h1>
    <p>{}</p>
    <a href="/">Return to homepage</a>
</body>
</html>"#,
            status.as_u16(),
            status.as_u16(),
            message
        );

        (status, axum::response::Html(html)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
