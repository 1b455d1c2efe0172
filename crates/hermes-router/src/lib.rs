//! Signature-encoded endpoint router for Hermes.
//!
//! Declared endpoints are compiled into [`EndpointDescriptor`]s and keyed by
//! an [`EncodedSignature`]: the method and every path segment turned into a
//! numeric token, with placeholders represented by the class of their type.
//! A request path is encoded the same way against the same
//! [`TokenDictionary`], so matching is a hash lookup in the common case.
//!
//! # Example
//!
//! ```rust
//! use hermes_router::{EndpointDeclaration, MatchPass, Router, ServiceDescriptor};
//! use http::Method;
//!
//! let mut router = Router::new();
//! let files = ServiceDescriptor::new("files", "/files");
//! let decl = |name: &str, path: &str| EndpointDeclaration {
//!     name: name.into(),
//!     method: "GET".into(),
//!     path: path.into(),
//!     ..Default::default()
//! };
//! router.register(&files, &decl("stat", "/stat/{id:int}")).unwrap();
//! router.register(&files, &decl("read", "/raw/{...:string}")).unwrap();
//!
//! let found = router.match_route(&Method::GET, "/files/raw/a/b/c").unwrap();
//! assert_eq!(found.descriptor.name, "read");
//! assert_eq!(found.trailing, vec!["a", "b", "c"]);
//! assert_eq!(found.pass, MatchPass::VariableLength);
//! ```
//!
//! # Matching
//!
//! ```text
//!   GET /users/42
//!        │
//!   encode ──► "3 16 17 2 "  (GET, users, <int>)
//!        │
//!   exact lookup ── miss ──► force unknown segments to <string>
//!        │                            │
//!        │                      exact lookup ── miss ──► variable-length roots
//!        │                                                        │
//!        ▼                                                  shape scan
//!     RouteMatch
//! ```

mod compile;
mod descriptor;
mod dictionary;
mod error;
mod method;
mod params;
mod router;
mod signature;
mod table;

pub use compile::compile;
pub use descriptor::{
    EndpointDeclaration, EndpointDescriptor, Param, SecurityRequirement,
    ServiceDescriptor, VARIABLE_LENGTH_PARAM,
};
pub use dictionary::TokenDictionary;
pub use error::ValidationError;
pub use method::{default_status, parse_method, ALLOWED_METHODS};
pub use params::Params;
pub use router::Router;
pub use signature::{
    encode_registration, encode_request, placeholder_class, split_path, EncodedSignature,
    UnknownSegments,
};
pub use table::RouteTable;

use std::sync::Arc;

/// Which matching pass found the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchPass {
    /// Exact signature with classified unknown segments.
    Exact,
    /// Exact signature with unknown segments read as strings.
    StringFallback,
    /// Variable-length root prefix.
    VariableLength,
    /// Shape scan over endpoints of the same method and length.
    Shape,
}

/// A matched endpoint with its raw path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The matched endpoint.
    pub descriptor: Arc<EndpointDescriptor>,
    /// Raw path parameter values. A variable-length endpoint records its
    /// trailing segments joined with `/` under its placeholder name.
    pub params: Params,
    /// Trailing segments of a variable-length match; empty otherwise.
    pub trailing: Vec<String>,
    /// The pass that produced this match.
    pub pass: MatchPass,
}
