//! Request classification and token checks

use crate::request::{Request, CSRF_HEADER, FORM_FIELD, XSRF_HEADER};
use crate::token::constant_time_eq;
use http::Method;

/// Check if HTTP method is considered safe (doesn't need a token)
#[must_use]
pub const fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD)
}

/// Default token lookup
///
/// Looks in order at:
/// 1. the [`FORM_FIELD`] parameter, with form parameters overriding
///    multipart fields of the same name
/// 2. the [`CSRF_HEADER`] header
/// 3. the [`XSRF_HEADER`] header
///
/// Header values that are not visible ASCII are skipped.
#[must_use]
pub fn default_read_token(request: &Request) -> Option<String> {
    request
        .form_params
        .get(FORM_FIELD)
        .or_else(|| request.multipart_params.get(FORM_FIELD))
        .cloned()
        .or_else(|| header_value(request, CSRF_HEADER))
        .or_else(|| header_value(request, XSRF_HEADER))
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Check the presented token against the session token
///
/// Both must be present, and they are compared in constant time.
#[must_use]
pub fn is_valid<F>(request: &Request, read_token: F) -> bool
where
    F: Fn(&Request) -> Option<String>,
{
    let Some(stored) = request.session.anti_forgery_token() else {
        return false;
    };
    let Some(presented) = read_token(request) else {
        return false;
    };

    constant_time_eq(&presented, stored)
}
