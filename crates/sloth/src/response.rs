//! HTTP response constructors.

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};

pub fn ok_html(body: impl Into<String>) -> Response {
    Html(body.into()).into_response()
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Html("<h1>Not Found</h1>".to_string())).into_response()
}

pub fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, Html("<h1>Bad Request</h1>".to_string())).into_response()
}

pub fn internal_server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html("<h1>Internal Server Error</h1>".to_string()),
    )
        .into_response()
}

/// 307, preserving the request method on replay.
pub fn temporary_redirect(location: &str) -> Response {
    let mut response = StatusCode::TEMPORARY_REDIRECT.into_response();
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}

/// Discard the body of a HEAD response while keeping status and
/// headers intact. Other methods pass through untouched.
pub fn with_head_support(method: &Method, response: Response) -> Response {
    if method != Method::HEAD {
        return response;
    }
    let (parts, _) = response.into_parts();
    Response::from_parts(parts, Body::empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_sets_location() {
        let response = temporary_redirect("/blog");
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/blog");
    }

    #[test]
    fn head_keeps_status_and_headers() {
        let response = with_head_support(&Method::HEAD, ok_html("<p>hi</p>"));
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::CONTENT_TYPE));
    }

    #[test]
    fn get_passes_through() {
        let response = with_head_support(&Method::GET, ok_html("<p>hi</p>"));
        assert_eq!(response.status(), StatusCode::OK);
    }
}
