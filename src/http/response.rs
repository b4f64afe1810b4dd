//! Synthesized error responses.
//!
//! Materializes the configured `not_found` / `server_error` pages as fully
//! formed HTTP/1.1 responses. Bodies are static (never interpolated) and no
//! upstream is contacted.

use axum::body::Body;
use axum::http::header::CONTENT_LENGTH;
use axum::http::{Response, StatusCode, Version};

use crate::config::{ErrorPage, ResponseConfig};

/// The configured not-found page (default 404).
pub fn not_found(pages: &ResponseConfig) -> Response<Body> {
    page_response(&pages.not_found)
}

/// The configured server-error page (default 500).
pub fn internal_server_error(pages: &ResponseConfig) -> Response<Body> {
    page_response(&pages.server_error)
}

fn page_response(page: &ErrorPage) -> Response<Body> {
    let status =
        StatusCode::from_u16(page.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    Response::builder()
        .status(status)
        .version(Version::HTTP_11)
        .header(CONTENT_LENGTH, page.body.len())
        .body(Body::from(page.body.clone()))
        .expect("static error response construction cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn not_found_uses_configured_code_and_body() {
        let pages = ResponseConfig::default();
        let response = not_found(&pages);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.version(), Version::HTTP_11);
        assert_eq!(
            response
                .headers()
                .get(CONTENT_LENGTH)
                .unwrap()
                .to_str()
                .unwrap(),
            pages.not_found.body.len().to_string()
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, pages.not_found.body.as_bytes());
    }

    #[tokio::test]
    async fn custom_page_overrides_code_and_body() {
        let mut pages = ResponseConfig::default();
        pages.server_error = ErrorPage {
            code: 503,
            body: "busy".to_string(),
        };

        let response = internal_server_error(&pages);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, b"busy".as_ref());
    }

    #[test]
    fn invalid_configured_code_falls_back_to_500() {
        let page = ErrorPage {
            code: 0,
            body: String::new(),
        };
        assert_eq!(
            page_response(&page).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
