//! Flash message helpers.
//!
//! Messages travel in a short-lived cookie set on the redirect response and
//! are rendered client-side on the next page view.

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Redirect, Response};

pub const FLASH_COOKIE: &str = "vb_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Error => "error",
        }
    }
}

/// A flash message attached to a redirect.
#[derive(Debug, Clone)]
pub struct Flash {
    level: Level,
    message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: Level::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: Level::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: Level::Error, message: message.into() }
    }

    /// Redirect to `path` carrying this message.
    pub fn redirect(self, path: &str) -> Response {
        let cookie = format!(
            "{}={}:{}; Path=/; Max-Age=10; SameSite=Lax",
            FLASH_COOKIE,
            self.level.as_str(),
            percent_encode(&self.message),
        );
        let mut response = Redirect::to(path).into_response();
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        response
    }
}

/// Minimal percent-encoding for the cookie value: keeps unreserved ASCII,
/// escapes everything else.
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn percent_encoding_escapes_separators() {
        assert_eq!(percent_encode("ok"), "ok");
        assert_eq!(
            percent_encode("Booking cancelled successfully."),
            "Booking%20cancelled%20successfully."
        );
        assert_eq!(percent_encode("a;b"), "a%3Bb");
    }

    #[test]
    fn redirect_carries_flash_cookie() {
        let response = Flash::success("Saved.").redirect("/bookings");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("vb_flash=success:"));
        assert!(cookie.contains("Max-Age=10"));
        let location = response.headers().get(header::LOCATION).unwrap();
        assert_eq!(location, "/bookings");
    }
}
