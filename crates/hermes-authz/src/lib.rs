//! # Hermes Authz
//!
//! Security schemes and the authorizer registry consulted before an
//! endpoint is invoked.
//!
//! An endpoint lists the schemes it accepts, each with a scope list that may
//! reference path values (`read[{id}]`). At request time the schemes are
//! tried in order: the scheme's credential is pulled from the request, the
//! scopes are interpolated, and the scheme's [`Authorizer`] decides. The
//! first scheme that says yes lets the request through; if none does the
//! request is answered `401`.
//!
//! How credentials are actually validated is up to the authorizer. Hermes
//! ships only [`AllowAll`], which is meant for development.
//!
//! ## Example
//!
//! ```rust
//! use hermes_authz::{AuthorizationRequest, AuthorizerRegistry, SecurityScheme};
//!
//! let mut registry = AuthorizerRegistry::new();
//! registry.register_scheme("key", SecurityScheme::api_key_header("X-Api-Key"));
//! registry.register_authorizer("key", |req: &AuthorizationRequest<'_>| {
//!     req.credential == "s3cr3t" && req.scopes.iter().all(|s| s.starts_with("read"))
//! });
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-authz/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod authorizer;
mod error;
mod registry;
mod scheme;
mod scope;

pub use authorizer::{AllowAll, AuthorizationRequest, Authorizer};
pub use error::{AuthzError, AuthzResult};
pub use registry::AuthorizerRegistry;
pub use scheme::{CredentialLocation, SchemeMode, SecurityScheme};
pub use scope::{interpolate_scope, interpolate_scopes};
