//! Route handlers

pub mod manage;
pub mod venues;
pub mod wishlist;

use axum::http::HeaderMap;

/// AJAX callers are detected via the X-Requested-With header or an Accept
/// header asking for JSON.
pub(crate) fn wants_json(headers: &HeaderMap) -> bool {
    if headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "XMLHttpRequest")
    {
        return true;
    }
    headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn ajax_detection_via_requested_with_header() {
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers));

        headers.insert(
            "x-requested-with",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        assert!(wants_json(&headers));
    }

    #[test]
    fn ajax_detection_via_accept_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain"),
        );
        assert!(wants_json(&headers));

        let mut html = HeaderMap::new();
        html.insert(
            axum::http::header::ACCEPT,
            HeaderValue::from_static("text/html"),
        );
        assert!(!wants_json(&html));
    }
}
