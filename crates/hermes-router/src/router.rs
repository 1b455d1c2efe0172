//! High-level router API.

use crate::compile::compile;
use crate::descriptor::{EndpointDeclaration, EndpointDescriptor, ServiceDescriptor};
use crate::dictionary::TokenDictionary;
use crate::error::ValidationError;
use crate::table::RouteTable;
use crate::RouteMatch;
use http::Method;
use std::sync::Arc;

/// A token dictionary and the route table compiled against it.
///
/// # Example
///
/// ```rust
/// use hermes_router::{EndpointDeclaration, Router, ServiceDescriptor};
/// use http::Method;
///
/// let mut router = Router::new();
/// let service = ServiceDescriptor::new("users", "/users");
/// router
///     .register(
///         &service,
///         &EndpointDeclaration {
///             name: "get".into(),
///             method: "GET".into(),
///             path: "/{id:int}".into(),
///             ..Default::default()
///         },
///     )
///     .unwrap();
///
/// let found = router.match_route(&Method::GET, "/users/42").unwrap();
/// assert_eq!(found.descriptor.operation_id, "users.get");
/// assert_eq!(found.params.get("id"), Some("42"));
/// // the shape still matches; binding rejects "abc" as an int
/// assert!(router.match_route(&Method::GET, "/users/abc").is_some());
/// assert!(router.match_route(&Method::GET, "/accounts/42").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Router {
    dictionary: TokenDictionary,
    table: RouteTable,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles a declaration and adds it to the table.
    pub fn register(
        &mut self,
        service: &ServiceDescriptor,
        decl: &EndpointDeclaration,
    ) -> Result<Arc<EndpointDescriptor>, ValidationError> {
        let descriptor = compile(&mut self.dictionary, service, decl)?;
        let descriptor = self.table.insert(descriptor)?;
        tracing::debug!(
            operation = %descriptor.operation_id,
            method = %descriptor.method,
            signature = %descriptor.signature,
            key = %descriptor.key,
            "compiled endpoint"
        );
        Ok(descriptor)
    }

    /// Matches a raw path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.table.match_route(&self.dictionary, method, path)
    }

    /// Matches decoded path segments.
    #[must_use]
    pub fn match_segments<S: AsRef<str>>(&self, method: &Method, segments: &[S]) -> Option<RouteMatch> {
        self.table.match_segments(&self.dictionary, method, segments)
    }

    /// Returns the token dictionary.
    #[must_use]
    pub const fn dictionary(&self) -> &TokenDictionary {
        &self.dictionary
    }

    /// Returns the route table.
    #[must_use]
    pub const fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Returns the number of registered endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if no endpoint is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
