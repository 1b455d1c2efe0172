//! # Hermes Extract
//!
//! Marshallers, content negotiation and argument binding for Hermes.
//!
//! Once the router has matched a request, this crate turns the request's raw
//! pieces into the handler's argument list:
//!
//! | Stage | Function | Input |
//! |-------|----------|-------|
//! | Content type | [`resolve_content_type`] | `Content-Type` header, consumes lists |
//! | Body | [`bind_body`] | Raw bytes, decoded by a [`Marshaller`] |
//! | Path | [`bind_path_args`] | Matched path values or trailing segments |
//! | Query | [`bind_query_args`] | Parsed [`QueryArgs`] |
//!
//! [`bind_arguments`] runs all four in order. The response side picks its
//! MIME type with [`resolve_output_mime`] and encodes through the same
//! [`MarshallerRegistry`].
//!
//! ## Example
//!
//! ```rust
//! use hermes_extract::{bind_path_args, bind_query_args, QueryArgs};
//! use hermes_core::{Arg, Scalar};
//! use hermes_router::{EndpointDeclaration, Router, ServiceDescriptor};
//! use http::Method;
//!
//! let mut router = Router::new();
//! let decl = EndpointDeclaration {
//!     name: "get".into(),
//!     method: "GET".into(),
//!     path: "/items/{id:int}?{full:bool}".into(),
//!     ..Default::default()
//! };
//! router.register(&ServiceDescriptor::new("items", "/"), &decl).unwrap();
//!
//! let route = router.match_route(&Method::GET, "/items/9").unwrap();
//! let mut args = bind_path_args(&route.descriptor, &route.params, &route.trailing).unwrap();
//! let query = QueryArgs::parse("full=T").unwrap();
//! args.extend(bind_query_args(&route.descriptor, &query).unwrap());
//!
//! assert_eq!(args, vec![Arg::Scalar(Scalar::Int(9)), Arg::Scalar(Scalar::Bool(true))]);
//! ```
//!
//! ## Errors
//!
//! Every binding failure is a [`BindError`] tagged with its [`BindSource`];
//! all of them answer `400 Bad Request`.

#![doc(html_root_url = "https://docs.rs/hermes-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
mod body;
mod error;
mod marshal;
pub mod multipart;
mod negotiate;
mod path;
mod query;

pub use binder::{bind_arguments, BindContext, BindContextBuilder, BindOptions};
pub use body::bind_body;
pub use error::{BindError, BindSource};
pub use marshal::{
    FormMarshaller, JsonMarshaller, MarshalError, Marshaller, MarshallerRegistry, TextMarshaller,
    APPLICATION_FORM, APPLICATION_JSON, TEXT_PLAIN,
};
pub use multipart::MultipartConfig;
pub use negotiate::{
    effective, essence, is_multipart, resolve_content_type, resolve_output_mime, MULTIPART_FORM_DATA,
};
pub use path::{bind_path_args, decode_path};
pub use query::{bind_query_args, QueryArgs};
