//! Declarative service registration.
//!
//! A service is a [`Service`] type plus the metadata of its endpoints. The
//! metadata mirrors what an annotated service definition carries: a root,
//! default MIME lists, a gzip default and, per endpoint, the method, the
//! path signature, output and body types, security requirements and
//! overrides.
//!
//! ```rust
//! use hermes_core::{Body, HermesError, RequestContext, Service};
//! use hermes_server::{EndpointSpec, ServiceBuilder};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Item {
//!     name: String,
//! }
//!
//! struct Items;
//!
//! impl Service for Items {
//!     fn instantiate(_ctx: RequestContext) -> Self {
//!         Items
//!     }
//! }
//!
//! impl Items {
//!     fn get(&self, id: i64) -> Result<Item, HermesError> {
//!         Ok(Item { name: format!("item {id}") })
//!     }
//!
//!     fn create(&self, item: Body<Item>) -> Result<Item, HermesError> {
//!         Ok(item.into_inner())
//!     }
//! }
//!
//! let service = ServiceBuilder::<Items>::new("/items")
//!     .endpoint("get", EndpointSpec::get("/{id:int}").output("Item"), Items::get)
//!     .endpoint("create", EndpointSpec::post("/").body("Item").output("Item"), Items::create);
//! assert_eq!(service.len(), 2);
//! ```

use crate::invoker::{Invoker, TypedInvoker};
use hermes_core::{Endpoint, Service};
use hermes_router::{EndpointDeclaration, ServiceDescriptor};
use std::marker::PhantomData;
use std::sync::Arc;

/// Metadata of one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointSpec {
    decl: EndpointDeclaration,
}

impl EndpointSpec {
    /// Declares an endpoint with an HTTP method and a path signature such as
    /// `/users/{id:int}?{verbose:bool}`.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            decl: EndpointDeclaration {
                method: method.into(),
                path: path.into(),
                ..EndpointDeclaration::default()
            },
        }
    }

    /// `GET`
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    /// `POST`
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    /// `PUT`
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new("PUT", path)
    }

    /// `PATCH`
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new("PATCH", path)
    }

    /// `DELETE`
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new("DELETE", path)
    }

    /// Declares the output type: `T`, `[]T` or `map[string]T`.
    ///
    /// Endpoints without an output answer with an empty body.
    #[must_use]
    pub fn output(mut self, output: impl Into<String>) -> Self {
        self.decl.output = Some(output.into());
        self
    }

    /// Declares the body type: `T`, `[]T` or `map[string]T`.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.decl.body = Some(body.into());
        self
    }

    /// Adds a security requirement: `scheme` or `scheme:[scope, scope]`.
    /// Requirements are alternatives; any one of them suffices.
    #[must_use]
    pub fn security(mut self, requirement: impl Into<String>) -> Self {
        self.decl.security.push(requirement.into());
        self
    }

    /// Overrides the consumed MIME types.
    #[must_use]
    pub fn consumes<I, M>(mut self, mimes: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.decl.consumes = mimes.into_iter().map(Into::into).collect();
        self
    }

    /// Overrides the produced MIME types.
    #[must_use]
    pub fn produces<I, M>(mut self, mimes: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.decl.produces = mimes.into_iter().map(Into::into).collect();
        self
    }

    /// Overrides the service's gzip default.
    #[must_use]
    pub fn gzip(mut self, allowed: bool) -> Self {
        self.decl.gzip = Some(allowed);
        self
    }

    /// Returns the declaration.
    #[must_use]
    pub fn declaration(&self) -> &EndpointDeclaration {
        &self.decl
    }

    pub(crate) fn into_declaration(self, name: String) -> EndpointDeclaration {
        EndpointDeclaration { name, ..self.decl }
    }
}

pub(crate) struct RegisteredEndpoint {
    pub(crate) decl: EndpointDeclaration,
    pub(crate) invoker: Arc<dyn Invoker>,
}

/// The type-erased content of a [`ServiceBuilder`].
pub(crate) struct ServiceRegistration {
    pub(crate) descriptor: ServiceDescriptor,
    pub(crate) endpoints: Vec<RegisteredEndpoint>,
}

/// Collects a service's settings and endpoints.
pub struct ServiceBuilder<S> {
    descriptor: ServiceDescriptor,
    endpoints: Vec<RegisteredEndpoint>,
    _service: PhantomData<fn() -> S>,
}

impl<S: Service> ServiceBuilder<S> {
    /// Starts a service mounted at `root`, consuming and producing JSON,
    /// without gzip. The service name defaults to the type name.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        let type_name = std::any::type_name::<S>();
        let name = type_name.rsplit("::").next().unwrap_or(type_name);
        Self {
            descriptor: ServiceDescriptor::new(name, normalize_root(&root.into())),
            endpoints: Vec::new(),
            _service: PhantomData,
        }
    }

    /// Sets the name used in operation ids (`service.endpoint`).
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.descriptor.name = name.into();
        self
    }

    /// Sets the default consumed MIME types.
    #[must_use]
    pub fn consumes<I, M>(mut self, mimes: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.descriptor.consumes = mimes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the default produced MIME types.
    #[must_use]
    pub fn produces<I, M>(mut self, mimes: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.descriptor.produces = mimes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether responses may be gzip-compressed by default.
    #[must_use]
    pub fn gzip(mut self, allowed: bool) -> Self {
        self.descriptor.gzip = allowed;
        self
    }

    /// Adds an endpoint served by `handler`.
    ///
    /// The handler's parameters are checked against the declaration when the
    /// dispatcher is built.
    #[must_use]
    pub fn endpoint<Args, E>(mut self, name: impl Into<String>, spec: EndpointSpec, handler: E) -> Self
    where
        E: Endpoint<S, Args>,
        Args: 'static,
    {
        self.endpoints.push(RegisteredEndpoint {
            decl: spec.into_declaration(name.into()),
            invoker: Arc::new(TypedInvoker::<S, E, Args>::new(handler)),
        });
        self
    }

    /// Returns the service settings.
    #[must_use]
    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    /// Returns the number of endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` if no endpoint was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub(crate) fn into_registration(self) -> ServiceRegistration {
        ServiceRegistration {
            descriptor: self.descriptor,
            endpoints: self.endpoints,
        }
    }
}

impl<S> std::fmt::Debug for ServiceBuilder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceBuilder")
            .field("descriptor", &self.descriptor)
            .field(
                "endpoints",
                &self.endpoints.iter().map(|e| e.decl.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Normalizes a root: `/` becomes empty, surrounding slashes are trimmed
/// and a single leading `/` is added.
#[must_use]
pub fn normalize_root(root: &str) -> String {
    let trimmed = root.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Joins a registrar prefix and a service root.
#[must_use]
pub fn join_roots(prefix: &str, root: &str) -> String {
    let prefix = normalize_root(prefix);
    let root = normalize_root(root);
    normalize_root(&format!("{prefix}{root}"))
}
