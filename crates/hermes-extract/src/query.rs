//! Query string parsing and query argument binding.
//!
//! Declared query parameters are optional and order-independent. A missing
//! parameter binds its type's zero value; a present one must convert.

use crate::error::{BindError, BindSource};
use crate::path::validate_escapes;
use hermes_core::Arg;
use hermes_router::EndpointDescriptor;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

/// Decoded query string. When a name repeats, the first value wins.
///
/// # Example
///
/// ```rust
/// use hermes_extract::QueryArgs;
///
/// let query = QueryArgs::parse("q=red+fox&page=2&page=3").unwrap();
/// assert_eq!(query.get("q"), Some("red fox"));
/// assert_eq!(query.get("page"), Some("2"));
/// assert!(QueryArgs::parse("q=%G1").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryArgs {
    values: HashMap<String, String>,
}

impl QueryArgs {
    /// Parses a raw query string (without the leading `?`).
    ///
    /// # Errors
    ///
    /// Returns a [`BindError`] for broken percent escapes or escapes that
    /// decode to invalid UTF-8.
    pub fn parse(raw: &str) -> Result<Self, BindError> {
        for piece in raw.split('&').filter(|piece| !piece.is_empty()) {
            if !validate_escapes(piece) {
                return Err(BindError::malformed(
                    BindSource::Query,
                    format!("invalid percent escape in {piece:?}"),
                ));
            }
            let spaced = piece.replace('+', " ");
            if percent_decode_str(&spaced).decode_utf8().is_err() {
                return Err(BindError::malformed(
                    BindSource::Query,
                    format!("{piece:?} is not valid UTF-8"),
                ));
            }
        }

        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw)
            .map_err(|e| BindError::malformed(BindSource::Query, e.to_string()))?;
        let mut values = HashMap::with_capacity(pairs.len());
        for (name, value) in pairs {
            values.entry(name).or_insert(value);
        }
        Ok(Self { values })
    }

    /// Parses the query component of a URI, if any.
    pub fn from_uri(uri: &http::Uri) -> Result<Self, BindError> {
        uri.query().map_or_else(|| Ok(Self::default()), Self::parse)
    }

    /// Returns the first value for a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns the number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the query string was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Converts the declared query parameters to arguments in declaration order.
pub fn bind_query_args(
    descriptor: &EndpointDescriptor,
    query: &QueryArgs,
) -> Result<Vec<Arg>, BindError> {
    descriptor
        .query_params
        .iter()
        .map(|param| match query.get(&param.name) {
            None => Ok(param.param_type.zero()),
            Some(raw) => param
                .param_type
                .convert(raw)
                .map_err(|e| BindError::invalid_type(BindSource::Query, &param.name, e.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::Scalar;
    use hermes_router::{EndpointDeclaration, Router, ServiceDescriptor};
    use http::Method;

    fn search_router() -> Router {
        let mut router = Router::new();
        let decl = EndpointDeclaration {
            name: "search".into(),
            method: "GET".into(),
            path: "/search?{q:string}&{limit:int}&{tags:[]string}&{exact:bool}".into(),
            ..Default::default()
        };
        router.register(&ServiceDescriptor::new("svc", "/"), &decl).unwrap();
        router
    }

    #[test]
    fn test_missing_params_bind_zero_values() {
        let router = search_router();
        let found = router.match_route(&Method::GET, "/search").unwrap();
        let args = bind_query_args(&found.descriptor, &QueryArgs::default()).unwrap();
        assert_eq!(
            args,
            vec![
                Arg::Scalar(Scalar::Str(String::new())),
                Arg::Scalar(Scalar::Int(0)),
                Arg::List(Vec::new()),
                Arg::Scalar(Scalar::Bool(false)),
            ]
        );
    }

    #[test]
    fn test_params_bind_in_declaration_order() {
        let router = search_router();
        let found = router.match_route(&Method::GET, "/search").unwrap();
        let query = QueryArgs::parse("exact=T&tags=a,b&limit=5&q=fox").unwrap();
        let args = bind_query_args(&found.descriptor, &query).unwrap();
        assert_eq!(
            args,
            vec![
                Arg::Scalar(Scalar::Str("fox".into())),
                Arg::Scalar(Scalar::Int(5)),
                Arg::List(vec![Scalar::Str("a".into()), Scalar::Str("b".into())]),
                Arg::Scalar(Scalar::Bool(true)),
            ]
        );
    }

    #[test]
    fn test_bad_conversion_names_the_param() {
        let router = search_router();
        let found = router.match_route(&Method::GET, "/search").unwrap();
        let query = QueryArgs::parse("limit=lots").unwrap();
        let err = bind_query_args(&found.descriptor, &query).unwrap_err();
        assert_eq!(err.bind_source(), BindSource::Query);
        assert_eq!(err.field(), Some("limit"));
    }

    #[test]
    fn test_invalid_utf8_escape() {
        assert!(QueryArgs::parse("q=%C3%28").is_err());
        assert_eq!(QueryArgs::parse("q=%C3%A9").unwrap().get("q"), Some("é"));
    }

    #[test]
    fn test_from_uri() {
        let uri: http::Uri = "/search?q=a%26b".parse().unwrap();
        let query = QueryArgs::from_uri(&uri).unwrap();
        assert_eq!(query.get("q"), Some("a&b"));
        let bare: http::Uri = "/search".parse().unwrap();
        assert!(QueryArgs::from_uri(&bare).unwrap().is_empty());
    }
}
