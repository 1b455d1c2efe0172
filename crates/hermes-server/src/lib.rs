//! # Hermes Server
//!
//! Service registration, the dispatch pipeline and the HTTP transport.
//!
//! - [`ServiceBuilder`] / [`EndpointSpec`] - declare services and endpoints
//! - [`DispatcherBuilder`] - validate every declaration and build the
//!   [`Dispatcher`]
//! - [`Dispatcher::dispatch`] - answer one in-memory request
//! - [`Server`] / [`serve`] - hyper HTTP/1 front end with graceful shutdown
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use hermes_core::{HermesError, RequestContext, Service};
//! use hermes_server::{Dispatcher, EndpointSpec, ServiceBuilder};
//! use http::{Request, StatusCode};
//!
//! struct Users;
//!
//! impl Service for Users {
//!     fn instantiate(_ctx: RequestContext) -> Self {
//!         Users
//!     }
//! }
//!
//! impl Users {
//!     fn get(&self, id: i64) -> Result<String, HermesError> {
//!         Ok(format!("user {id}"))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let dispatcher = Dispatcher::builder()
//!     .service(ServiceBuilder::<Users>::new("/users").endpoint(
//!         "get",
//!         EndpointSpec::get("/{id:int}").output("string"),
//!         Users::get,
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let request = Request::get("/users/42").body(Bytes::new()).unwrap();
//! let response = dispatcher.dispatch(request).await;
//! assert_eq!(response.status(), StatusCode::OK);
//!
//! let request = Request::get("/users/abc").body(Bytes::new()).unwrap();
//! assert_eq!(dispatcher.dispatch(request).await.status(), StatusCode::BAD_REQUEST);
//!
//! let request = Request::get("/accounts/42").body(Bytes::new()).unwrap();
//! assert_eq!(dispatcher.dispatch(request).await.status(), StatusCode::NOT_FOUND);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod dispatcher;
mod invoker;
mod registration;
mod response;
mod server;
mod shutdown;

pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use dispatcher::{Decoration, Dispatcher, DispatcherBuilder, PathSecurity, ResponseDecorator};
pub use registration::{join_roots, normalize_root, EndpointSpec, ServiceBuilder};
pub use response::{
    accepts_gzip, add_cors_headers, error_response, gzip, is_preflight, preflight_response,
    HttpResponse, ResponseBody, CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS,
};
pub use server::{serve, serve_with_shutdown, Server, ServerError};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
