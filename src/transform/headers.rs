//! Ordered header rewrites.
//!
//! Applies one direction's configured transform to a header map: all inserts
//! (append semantics), then all overrides (replace all values), then all
//! deletes. Insert and override values are interpolated against the current
//! route and HTTP object before being applied, so earlier operations are
//! visible to later templates.

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::HeaderTransformConfig;
use crate::routing::Route;
use crate::transform::interpolate::{interpolate, HttpContext};

/// Apply a transform to request headers.
pub fn transform_request(
    transforms: &HeaderTransformConfig,
    route: Option<&Route>,
    headers: &mut HeaderMap,
) {
    tracing::trace!(route = route.map(|r| r.name.as_str()), "Rewriting request headers");
    apply(transforms, route, headers, None);
}

/// Apply a transform to response headers.
///
/// `request_headers` is the snapshot captured before the request-side
/// transform ran, so response templates can reference the client's original
/// request headers.
pub fn transform_response(
    transforms: &HeaderTransformConfig,
    route: Option<&Route>,
    headers: &mut HeaderMap,
    request_headers: &HeaderMap,
) {
    tracing::trace!(route = route.map(|r| r.name.as_str()), "Rewriting response headers");
    apply(transforms, route, headers, Some(request_headers));
}

fn apply(
    transforms: &HeaderTransformConfig,
    route: Option<&Route>,
    headers: &mut HeaderMap,
    captured_request: Option<&HeaderMap>,
) {
    // Earlier operations are visible to later templates, so the context is
    // rebuilt from the live map for every value.
    let expand = |headers: &HeaderMap, template: &str| -> String {
        let context = match captured_request {
            None => HttpContext::Request { headers },
            Some(request_headers) => HttpContext::Response {
                headers,
                request_headers,
            },
        };
        interpolate(template, route, &context)
    };

    for (name, template) in &transforms.insert {
        let value = expand(headers, template);
        let Some((name, value)) = parse_pair(name, &value) else {
            continue;
        };
        tracing::trace!(header = %name, value.new = %value.to_str().unwrap_or(""), "Adding header");
        headers.append(name, value);
    }

    for (name, template) in &transforms.r#override {
        let value = expand(headers, template);
        let Some((name, value)) = parse_pair(name, &value) else {
            continue;
        };
        tracing::trace!(header = %name, value.new = %value.to_str().unwrap_or(""), "Overwriting header");
        headers.insert(name, value);
    }

    for name in &transforms.delete {
        let Ok(name) = HeaderName::try_from(name.as_str()) else {
            continue;
        };
        tracing::trace!(header = %name, "Deleting header");
        headers.remove(&name);
    }
}

/// Parse a configured name/interpolated value into header types. Pairs that
/// do not form a legal header are skipped with a warning rather than failing
/// the request.
fn parse_pair(name: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
    let name = match HeaderName::try_from(name) {
        Ok(name) => name,
        Err(_) => {
            tracing::warn!(header = %name, "Skipping transform for invalid header name");
            return None;
        }
    };
    let value = match HeaderValue::from_str(value) {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(header = %name, "Skipping transform for invalid header value");
            return None;
        }
    };
    Some((name, value))
}
