//! Registration errors.

use hermes_core::{HermesError, TypeSpecError};
use thiserror::Error;

/// An endpoint declaration was rejected.
///
/// Every variant is fatal: registration stops at the first one and the
/// server never starts serving traffic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The declaration has no method.
    #[error("endpoint {endpoint}: no request method declared")]
    MissingMethod {
        /// Endpoint name.
        endpoint: String,
    },

    /// The declaration has no path.
    #[error("endpoint {endpoint}: no path declared")]
    MissingPath {
        /// Endpoint name.
        endpoint: String,
    },

    /// The method is not one of GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS.
    #[error("endpoint {endpoint}: unknown request method {method:?}")]
    UnknownMethod {
        /// Endpoint name.
        endpoint: String,
        /// The declared method.
        method: String,
    },

    /// A placeholder is not of the form `{name:type}`.
    #[error("placeholder {segment:?} in {signature} must be of the form {{name:type}}")]
    MalformedPlaceholder {
        /// Full endpoint signature.
        signature: String,
        /// The offending segment.
        segment: String,
    },

    /// A placeholder's type is not an allowed parameter type.
    #[error("type {type_name:?} is not allowed for path or query parameters in {signature}")]
    UnsupportedParamType {
        /// Full endpoint signature.
        signature: String,
        /// The declared type.
        type_name: String,
    },

    /// Two path parameters share a name.
    #[error("duplicate path parameter {name:?} in {signature}")]
    DuplicatePathParam {
        /// Full endpoint signature.
        signature: String,
        /// The repeated name.
        name: String,
    },

    /// Two query parameters share a name.
    #[error("duplicate query parameter {name:?} in {signature}")]
    DuplicateQueryParam {
        /// Full endpoint signature.
        signature: String,
        /// The repeated name.
        name: String,
    },

    /// A query entry is not a `{name:type}` placeholder.
    #[error("query parameter {entry:?} in {signature} must be of the form {{name:type}}")]
    MalformedQueryParam {
        /// Full endpoint signature.
        signature: String,
        /// The offending entry.
        entry: String,
    },

    /// A variable-length endpoint declares another path parameter.
    #[error("variable length endpoint {signature} can only declare one path parameter")]
    VariableLengthParams {
        /// Full endpoint signature.
        signature: String,
    },

    /// The `{...:type}` placeholder is not the last path segment.
    #[error("variable length placeholder must be the last segment of {signature}")]
    VariableLengthNotLast {
        /// Full endpoint signature.
        signature: String,
    },

    /// A body or output type declaration is invalid.
    #[error("endpoint {endpoint}: invalid {position} type: {source}")]
    InvalidType {
        /// Endpoint name.
        endpoint: String,
        /// `body` or `output`.
        position: &'static str,
        /// What was wrong with it.
        #[source]
        source: TypeSpecError,
    },

    /// A security declaration could not be parsed.
    #[error("endpoint {endpoint}: malformed security declaration {value:?}")]
    MalformedSecurity {
        /// Endpoint name.
        endpoint: String,
        /// The declaration.
        value: String,
    },

    /// The exact signature is already registered.
    #[error("{method} {signature} is already registered as {existing}")]
    DuplicateSignature {
        /// Request method.
        method: String,
        /// The new signature.
        signature: String,
        /// The signature it collides with.
        existing: String,
    },

    /// Another endpoint has the same method, root, length and literals.
    #[error("can not register two endpoints with the same request method ({method}) and shape: {signature} vs {existing}")]
    AmbiguousSignature {
        /// Request method.
        method: String,
        /// The new signature.
        signature: String,
        /// The signature it collides with.
        existing: String,
    },

    /// A variable-length endpoint's root overlaps another endpoint's root.
    #[error("variable length endpoints need a unique root: {root:?} overlaps {existing:?} for {method}")]
    VariableRootOverlap {
        /// Request method.
        method: String,
        /// The new root.
        root: String,
        /// The root it overlaps.
        existing: String,
    },

    /// Two endpoints were registered under the same operation id.
    #[error("operation {operation_id} is already registered")]
    DuplicateOperation {
        /// The repeated operation id.
        operation_id: String,
    },

    /// A consumed or produced MIME type has no marshaller.
    #[error("endpoint {endpoint}: no marshaller registered for {mime:?}")]
    UnsupportedMime {
        /// Endpoint name.
        endpoint: String,
        /// The MIME type.
        mime: String,
    },

    /// A security requirement names an unknown scheme or authorizer.
    #[error("endpoint {endpoint}: security scheme {scheme:?} has no {missing}")]
    UnknownSecurityScheme {
        /// Endpoint name.
        endpoint: String,
        /// The scheme name.
        scheme: String,
        /// `scheme definition` or `authorizer`.
        missing: &'static str,
    },

    /// The handler's parameters do not match the declaration.
    #[error("endpoint {endpoint}: handler takes ({found}) but the declaration binds ({expected})")]
    HandlerMismatch {
        /// Endpoint name.
        endpoint: String,
        /// Parameter kinds the declaration binds.
        expected: String,
        /// Parameter kinds the handler accepts.
        found: String,
    },
}

impl From<ValidationError> for HermesError {
    fn from(err: ValidationError) -> Self {
        Self::registration(err.to_string())
    }
}
