//! Request methods an endpoint may declare.

use http::Method;

/// The methods endpoints may be declared with.
pub const ALLOWED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

/// Parses a declared method name.
///
/// Names are matched case-sensitively against the upper-case forms, the
/// same way HTTP methods are compared on the wire.
///
/// # Example
///
/// ```rust
/// use hermes_router::parse_method;
/// use http::Method;
///
/// assert_eq!(parse_method("PATCH"), Some(Method::PATCH));
/// assert_eq!(parse_method("TRACE"), None);
/// assert_eq!(parse_method("get"), None);
/// ```
#[must_use]
pub fn parse_method(name: &str) -> Option<Method> {
    ALLOWED_METHODS
        .iter()
        .find(|method| method.as_str() == name.trim())
        .cloned()
}

/// Returns the status an endpoint answers with when the handler does not
/// override it: `201 Created` for POST, `200 OK` otherwise.
#[must_use]
pub fn default_status(method: &Method) -> http::StatusCode {
    if *method == Method::POST {
        http::StatusCode::CREATED
    } else {
        http::StatusCode::OK
    }
}
