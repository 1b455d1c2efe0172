//! # Hermes Core
//!
//! Core types and traits for the Hermes endpoint dispatch engine.
//!
//! - [`HermesError`] - The error every dispatch stage reports
//! - [`RequestContext`] - Per-request session attributes and response overrides
//! - [`ParamType`] / [`TypeSpec`] - Declared placeholder, body and output types
//! - [`Arg`] / [`FromArg`] / [`Body`] - Bound arguments and handler parameters
//! - [`Service`] / [`Endpoint`] - Handler-side traits

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod handler;
mod types;
mod value;

pub use context::{
    RequestContext, RequestId, ResponseOverrides, SessionData, HOST_ATTRIBUTE, SCOPE_ATTRIBUTE,
    USER_ID_ATTRIBUTE, USER_UUID_ATTRIBUTE,
};
pub use error::{ErrorCategory, ErrorDetail, ErrorEnvelope, HermesError, HermesResult};
pub use handler::{Endpoint, Service};
pub use types::{
    parse_bool, ConversionError, ParamType, TypeClass, TypeModifier, TypeSpec, TypeSpecError,
};
pub use value::{Arg, ArgKind, Body, FromArg, Scalar, ScalarKind};
