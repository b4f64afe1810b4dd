//! Placeholder interpolation for header templates and upstream URLs.
//!
//! Grammar (placeholders delimited by `{{` and `}}`):
//! - `{{route.name}}`: the matched route's name; empty when unmatched.
//! - `{{route.match}}`: the matched pattern; `<unmatched>` when unmatched.
//! - `{{req.header.<lowercase-name>}}`: request header values joined with
//!   no separator; empty when absent.
//! - `{{res.header.<lowercase-name>}}`: response header values; only
//!   meaningful when interpolating against a response.
//!
//! Unknown placeholders are left verbatim. Interpolation is a pure function
//! of its inputs and never mutates them.

use axum::http::HeaderMap;

use crate::routing::Route;

/// The HTTP object a template is interpolated against.
///
/// A response context also carries the request headers captured before the
/// request-side transform ran, so `{{req.header.*}}` stays meaningful during
/// response rewriting.
#[derive(Debug, Clone, Copy)]
pub enum HttpContext<'h, 'r> {
    Request {
        headers: &'h HeaderMap,
    },
    Response {
        headers: &'h HeaderMap,
        request_headers: &'r HeaderMap,
    },
}

impl<'h, 'r> HttpContext<'h, 'r> {
    fn request_headers(&self) -> &HeaderMap {
        match self {
            HttpContext::Request { headers } => headers,
            HttpContext::Response {
                request_headers, ..
            } => request_headers,
        }
    }

    fn response_headers(&self) -> Option<&HeaderMap> {
        match self {
            HttpContext::Request { .. } => None,
            HttpContext::Response { headers, .. } => Some(headers),
        }
    }
}

/// Substitute all recognized placeholders in `template`.
pub fn interpolate(template: &str, route: Option<&Route>, context: &HttpContext<'_, '_>) -> String {
    if !template.contains("{{") {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            // Unterminated delimiter: keep the tail verbatim.
            out.push_str(&rest[start..]);
            return out;
        };

        let token = &after[..end];
        match expand(token, route, context) {
            Some(value) => out.push_str(&value),
            None => {
                out.push_str("{{");
                out.push_str(token);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

/// Expand a single placeholder token, or `None` to leave it verbatim.
fn expand(token: &str, route: Option<&Route>, context: &HttpContext<'_, '_>) -> Option<String> {
    match token {
        "route.name" => Some(route.map(|r| r.name.clone()).unwrap_or_default()),
        "route.match" => Some(
            route
                .map(|r| r.matched_path.clone())
                .unwrap_or_else(|| "<unmatched>".to_string()),
        ),
        _ => {
            if let Some(name) = token.strip_prefix("req.header.") {
                if !is_lowercase_name(name) {
                    return None;
                }
                return Some(joined_values(context.request_headers(), name));
            }
            if let Some(name) = token.strip_prefix("res.header.") {
                if !is_lowercase_name(name) {
                    return None;
                }
                // Only valid against a response; verbatim otherwise.
                return context
                    .response_headers()
                    .map(|headers| joined_values(headers, name));
            }
            None
        }
    }
}

/// The grammar names headers in lowercase; other spellings are not
/// placeholders.
fn is_lowercase_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c.is_ascii_uppercase())
}

/// All values for a header, concatenated with no separator. Absent headers
/// (and names that are not legal header names) yield the empty string.
fn joined_values(headers: &HeaderMap, name: &str) -> String {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect()
}
