//! # Hermes
//!
//! **Declarative HTTP endpoint routing and dispatch**
//!
//! Services declare their endpoints as data: a method, a path template with
//! typed placeholders (`/users/{id:int}?{verbose:bool}`), body and output
//! types, MIME types and security requirements. Hermes validates every
//! declaration up front, compiles each path into a signature for
//! constant-time matching, binds typed arguments from the request and calls a
//! plain Rust function.
//!
//! ## Quick Start
//!
//! ```rust
//! use hermes::prelude::*;
//! use bytes::Bytes;
//! use http::{Request, StatusCode};
//!
//! struct Greeter;
//!
//! impl Service for Greeter {
//!     fn instantiate(_ctx: RequestContext) -> Self {
//!         Greeter
//!     }
//! }
//!
//! impl Greeter {
//!     fn hello(&self, name: String, shout: bool) -> Result<String, HermesError> {
//!         let greeting = format!("hello {name}");
//!         Ok(if shout { greeting.to_uppercase() } else { greeting })
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let dispatcher = Dispatcher::builder()
//!     .service(ServiceBuilder::<Greeter>::new("/greet").endpoint(
//!         "hello",
//!         EndpointSpec::get("/{name:string}?{shout:bool}").output("string"),
//!         Greeter::hello,
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let request = Request::get("/greet/ada?shout=true").body(Bytes::new()).unwrap();
//! let response = dispatcher.dispatch(request).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! # });
//! ```
//!
//! ## Request pipeline
//!
//! ```text
//! Request -> Preflight? -> Decode -> Route -> Security -> Bind -> Invoke -> Marshal -> Response
//! ```
//!
//! Any stage can fail; the failure becomes a JSON error envelope with the
//! matching status (404, 400, 401 or 500).

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use hermes_core as core;

// Re-export routing types
pub use hermes_router as router;

// Re-export binding and marshalling types
pub use hermes_extract as extract;

// Re-export security types
pub use hermes_authz as authz;

// Re-export server types
pub use hermes_server as server;

// Re-export logging setup
pub use hermes_telemetry as telemetry;

// Re-export configuration
pub use hermes_config as config;

// Re-export the outbound client
pub use hermes_client as client;

/// Prelude module for convenient imports.
///
/// ```rust
/// use hermes::prelude::*;
/// ```
pub mod prelude {
    pub use hermes_core::{
        Body, Endpoint, HermesError, HermesResult, RequestContext, Service, SCOPE_ATTRIBUTE,
        USER_UUID_ATTRIBUTE,
    };

    pub use hermes_router::ValidationError;

    pub use hermes_extract::{Marshaller, MarshallerRegistry, MultipartConfig};

    pub use hermes_authz::{AllowAll, AuthorizationRequest, Authorizer, SecurityScheme};

    pub use hermes_server::{
        Decoration, Dispatcher, DispatcherBuilder, EndpointSpec, PathSecurity, ResponseDecorator,
        Server, ServerConfig, ServiceBuilder, ShutdownSignal,
    };

    pub use hermes_config::{ConfigLoader, HermesConfig};

    pub use hermes_telemetry::{init_logging, LogConfig};

    pub use hermes_client::RequestBuilder;
}
