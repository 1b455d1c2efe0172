//! The request dispatch pipeline.
//!
//! A [`Dispatcher`] owns everything built at registration time (the router,
//! the typed invokers, marshallers and authorizers) and runs one request
//! through these stages:
//!
//! ```text
//!   preflight? ──► decode path ──► match route ──► authorize
//!                                                      │
//!   write response ◄── marshal ◄── invoke ◄── bind arguments
//! ```
//!
//! Any stage may end the request with an error envelope. Nothing a handler
//! does, panics included, escapes to the transport.

use crate::config::ServerConfig;
use crate::invoker::Invoker;
use crate::registration::{join_roots, ServiceBuilder, ServiceRegistration};
use crate::response::{
    accepts_gzip, add_cors_headers, error_response, gzip, is_preflight, preflight_response,
    with_body, HttpResponse,
};
use bytes::Bytes;
use hermes_authz::{Authorizer, AuthorizerRegistry, SecurityScheme};
use hermes_core::{Arg, ArgKind, HermesError, RequestContext, Service};
use hermes_extract::{
    bind_arguments, decode_path, resolve_output_mime, BindContext, BindOptions, Marshaller,
    MarshallerRegistry, MultipartConfig, QueryArgs,
};
use hermes_router::{default_status, EndpointDescriptor, Router, ServiceDescriptor, ValidationError};
use http::header::{self, HeaderValue};
use http::request::Parts;
use http::{Method, Request};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What a [`ResponseDecorator`] gets to see besides the payload.
#[derive(Debug, Clone, Copy)]
pub struct Decoration<'a> {
    /// The negotiated response MIME type.
    pub mime: &'a str,
    /// `http://` followed by the request's `Host`.
    pub base_url: &'a str,
    /// Scopes the authorizer granted to the caller.
    pub scopes: &'a [String],
    /// The request context.
    pub context: &'a RequestContext,
}

/// Rewrites handler output before it is encoded, e.g. to add links or to
/// strip fields the caller's scopes do not cover.
pub trait ResponseDecorator: Send + Sync + 'static {
    /// Returns the payload to encode.
    ///
    /// # Errors
    ///
    /// An error answers the request with its status.
    fn decorate(&self, decoration: &Decoration<'_>, payload: Value) -> Result<Value, HermesError>;
}

impl<F> ResponseDecorator for F
where
    F: Fn(&Decoration<'_>, Value) -> Result<Value, HermesError> + Send + Sync + 'static,
{
    fn decorate(&self, decoration: &Decoration<'_>, payload: Value) -> Result<Value, HermesError> {
        self(decoration, payload)
    }
}

/// An endpoint's path, method and the scopes of all its security
/// requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSecurity {
    /// Path with `{name}` placeholders and no query part.
    pub path: String,
    /// Request method.
    pub method: Method,
    /// Every declared scope, uninterpolated.
    pub scopes: Vec<String>,
}

/// The stage a request failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchStage {
    Decode,
    Route,
    Security,
    Bind,
    Invoke,
    Marshal,
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Decode => "decode",
            Self::Route => "route",
            Self::Security => "security",
            Self::Bind => "bind",
            Self::Invoke => "invoke",
            Self::Marshal => "marshal",
        };
        f.write_str(name)
    }
}

struct Failure {
    stage: DispatchStage,
    error: HermesError,
}

impl Failure {
    fn at(stage: DispatchStage) -> impl FnOnce(HermesError) -> Self {
        move |error| Self { stage, error }
    }

    fn new(stage: DispatchStage, error: impl Into<HermesError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }
}

struct EndpointEntry {
    invoker: Arc<dyn Invoker>,
    service: Arc<ServiceDescriptor>,
}

/// Builder for [`Dispatcher`].
///
/// # Example
///
/// ```rust
/// use hermes_core::{HermesError, RequestContext, Service};
/// use hermes_server::{DispatcherBuilder, EndpointSpec, ServerConfig, ServiceBuilder};
///
/// struct Ping;
///
/// impl Service for Ping {
///     fn instantiate(_ctx: RequestContext) -> Self {
///         Ping
///     }
/// }
///
/// impl Ping {
///     fn ping(&self) -> Result<String, HermesError> {
///         Ok("pong".into())
///     }
/// }
///
/// let dispatcher = DispatcherBuilder::new()
///     .config(ServerConfig::builder().root_path("/api").build())
///     .service(ServiceBuilder::<Ping>::new("/ping").endpoint(
///         "ping",
///         EndpointSpec::get("/").output("string"),
///         Ping::ping,
///     ))
///     .build()
///     .unwrap();
///
/// assert_eq!(dispatcher.len(), 1);
/// assert_eq!(dispatcher.path_security()[0].path, "/api/ping");
/// ```
pub struct DispatcherBuilder {
    config: ServerConfig,
    marshallers: MarshallerRegistry,
    authorizers: AuthorizerRegistry,
    decorator: Option<Arc<dyn ResponseDecorator>>,
    multipart: MultipartConfig,
    services: Vec<ServiceRegistration>,
}

impl DispatcherBuilder {
    /// Creates a builder with the default configuration and the JSON, form
    /// and text marshallers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            marshallers: MarshallerRegistry::with_defaults(),
            authorizers: AuthorizerRegistry::new(),
            decorator: None,
            multipart: MultipartConfig::default(),
            services: Vec::new(),
        }
    }

    /// Sets the server configuration.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a marshaller for a MIME type. Existing registrations win.
    #[must_use]
    pub fn marshaller(mut self, mime: &str, marshaller: impl Marshaller) -> Self {
        if !self.marshallers.register(mime, marshaller) {
            warn!(mime, "marshaller already registered, keeping the first");
        }
        self
    }

    /// Replaces the marshaller registry.
    #[must_use]
    pub fn marshallers(mut self, registry: MarshallerRegistry) -> Self {
        self.marshallers = registry;
        self
    }

    /// Defines a security scheme.
    #[must_use]
    pub fn security_scheme(mut self, name: impl Into<String>, scheme: SecurityScheme) -> Self {
        let name = name.into();
        if !self.authorizers.register_scheme(name.clone(), scheme) {
            warn!(scheme = %name, "security scheme already defined, keeping the first");
        }
        self
    }

    /// Registers the authorizer for a scheme.
    #[must_use]
    pub fn authorizer(mut self, scheme: impl Into<String>, authorizer: impl Authorizer) -> Self {
        let scheme = scheme.into();
        if !self.authorizers.register_authorizer(scheme.clone(), authorizer) {
            warn!(scheme = %scheme, "authorizer already registered, keeping the first");
        }
        self
    }

    /// Replaces the scheme and authorizer registry.
    #[must_use]
    pub fn authorizers(mut self, registry: AuthorizerRegistry) -> Self {
        self.authorizers = registry;
        self
    }

    /// Sets the response decorator.
    #[must_use]
    pub fn decorator(mut self, decorator: impl ResponseDecorator) -> Self {
        self.decorator = Some(Arc::new(decorator));
        self
    }

    /// Sets the multipart limits.
    #[must_use]
    pub fn multipart(mut self, config: MultipartConfig) -> Self {
        self.multipart = config;
        self
    }

    /// Adds a service.
    #[must_use]
    pub fn service<S: Service>(mut self, service: ServiceBuilder<S>) -> Self {
        self.services.push(service.into_registration());
        self
    }

    /// Adds a service mounted below `prefix`.
    #[must_use]
    pub fn service_on_path<S: Service>(mut self, prefix: &str, service: ServiceBuilder<S>) -> Self {
        let mut registration = service.into_registration();
        registration.descriptor.root = join_roots(prefix, &registration.descriptor.root);
        self.services.push(registration);
        self
    }

    /// Compiles every endpoint and checks it against the marshallers, the
    /// authorizers and its handler.
    ///
    /// # Errors
    ///
    /// The first [`ValidationError`] found. No dispatcher is built from a
    /// partly valid registration.
    pub fn build(self) -> Result<Dispatcher, ValidationError> {
        let mut router = Router::new();
        let mut entries: HashMap<String, EndpointEntry> = HashMap::new();

        for registration in self.services {
            let mut service = registration.descriptor;
            service.root = join_roots(self.config.root_path(), &service.root);
            check_mimes(&self.marshallers, &service.name, &service.consumes)?;
            check_mimes(&self.marshallers, &service.name, &service.produces)?;
            let service = Arc::new(service);

            for endpoint in registration.endpoints {
                let descriptor = router.register(&service, &endpoint.decl)?;
                check_mimes(&self.marshallers, &descriptor.operation_id, &descriptor.consumes)?;
                check_mimes(&self.marshallers, &descriptor.operation_id, &descriptor.produces)?;
                self.authorizers.validate(&descriptor)?;
                check_handler(&descriptor, endpoint.invoker.as_ref())?;
                if entries.contains_key(&descriptor.operation_id) {
                    return Err(ValidationError::DuplicateOperation {
                        operation_id: descriptor.operation_id.clone(),
                    });
                }
                info!(
                    endpoint = %descriptor.operation_id,
                    method = %descriptor.method,
                    path = %descriptor.signature,
                    "registered endpoint"
                );
                entries.insert(
                    descriptor.operation_id.clone(),
                    EndpointEntry {
                        invoker: endpoint.invoker,
                        service: Arc::clone(&service),
                    },
                );
            }
        }

        Ok(Dispatcher {
            router,
            entries,
            marshallers: self.marshallers,
            authorizers: self.authorizers,
            decorator: self.decorator,
            multipart: self.multipart,
            config: self.config,
        })
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("config", &self.config)
            .field("marshallers", &self.marshallers)
            .field("authorizers", &self.authorizers)
            .field("services", &self.services.len())
            .finish()
    }
}

fn check_mimes(
    marshallers: &MarshallerRegistry,
    endpoint: &str,
    mimes: &[String],
) -> Result<(), ValidationError> {
    match mimes.iter().find(|mime| !marshallers.supports(mime)) {
        Some(mime) => Err(ValidationError::UnsupportedMime {
            endpoint: endpoint.to_string(),
            mime: mime.clone(),
        }),
        None => Ok(()),
    }
}

fn check_handler(descriptor: &EndpointDescriptor, invoker: &dyn Invoker) -> Result<(), ValidationError> {
    let expected = descriptor.arg_kinds();
    let found = invoker.arg_kinds();
    if expected == found {
        return Ok(());
    }
    Err(ValidationError::HandlerMismatch {
        endpoint: descriptor.operation_id.clone(),
        expected: join_kinds(&expected),
        found: join_kinds(&found),
    })
}

fn join_kinds(kinds: &[ArgKind]) -> String {
    kinds.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Routes requests to registered endpoints.
///
/// Built once by [`DispatcherBuilder`] and shared read-only across
/// connections.
pub struct Dispatcher {
    router: Router,
    entries: HashMap<String, EndpointEntry>,
    marshallers: MarshallerRegistry,
    authorizers: AuthorizerRegistry,
    decorator: Option<Arc<dyn ResponseDecorator>>,
    multipart: MultipartConfig,
    config: ServerConfig,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoints", &self.entries.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the number of registered endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no endpoint is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lists every endpoint's cleaned path, method and declared scopes, in
    /// registration order.
    #[must_use]
    pub fn path_security(&self) -> Vec<PathSecurity> {
        self.router
            .table()
            .endpoints()
            .iter()
            .map(|descriptor| PathSecurity {
                path: clean_path(&descriptor.signature),
                method: descriptor.method.clone(),
                scopes: descriptor
                    .security
                    .iter()
                    .flat_map(|requirement| requirement.scopes.iter().cloned())
                    .collect(),
            })
            .collect()
    }

    /// Answers one request. Never fails: every error becomes a response.
    pub async fn dispatch(&self, request: Request<Bytes>) -> HttpResponse {
        let (parts, body) = request.into_parts();
        let allow_origin = self.config.allow_origin();

        if is_preflight(&parts.method, &parts.headers) {
            debug!(path = %parts.uri.path(), "answering preflight");
            return preflight_response(allow_origin);
        }

        let ctx = RequestContext::new(parts.method.clone(), parts.uri.path())
            .with_headers(parts.headers.clone());
        let request_id = ctx.request_id().to_string();

        let mut response = match self.run(&ctx, &parts, body).await {
            Ok(response) => response,
            Err(failure) => {
                log_failure(&failure, &parts);
                error_response(&failure.error, Some(&request_id))
            }
        };

        add_cors_headers(response.headers_mut(), allow_origin);
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        info!(
            request_id = %request_id,
            method = %parts.method,
            path = %parts.uri.path(),
            status = response.status().as_u16(),
            duration_ms = ctx.elapsed().as_secs_f64() * 1000.0,
            user = %ctx.user_uuid().unwrap_or_else(|| "public".to_string()),
            "request completed"
        );
        response
    }

    async fn run(&self, ctx: &RequestContext, parts: &Parts, body: Bytes) -> Result<HttpResponse, Failure> {
        let segments = decode_path(parts.uri.path()).map_err(|e| Failure::new(DispatchStage::Decode, e))?;
        let route = self.router.match_segments(&parts.method, &segments).ok_or_else(|| {
            Failure::new(
                DispatchStage::Route,
                HermesError::route_not_found(parts.method.as_str(), parts.uri.path()),
            )
        })?;
        let descriptor = Arc::clone(&route.descriptor);
        let entry = self.entries.get(&descriptor.operation_id).ok_or_else(|| {
            Failure::new(
                DispatchStage::Route,
                HermesError::internal(format!("no handler for {}", descriptor.operation_id)),
            )
        })?;

        let query = QueryArgs::from_uri(&parts.uri).map_err(|e| Failure::new(DispatchStage::Decode, e))?;
        self.authorizers
            .authorize(&descriptor, &route.params, &query, ctx)
            .map_err(|e| Failure::new(DispatchStage::Security, e))?;

        let bind_ctx = BindContext::new(parts.uri.clone(), parts.headers.clone(), body);
        let options = BindOptions {
            marshallers: Some(&self.marshallers),
            multipart: self.multipart,
            service_consumes: &entry.service.consumes,
            query: Some(&query),
        };
        let args = bind_arguments(&bind_ctx, &route, &options)
            .await
            .map_err(|e| Failure::new(DispatchStage::Bind, e))?;

        let output = invoke(entry.invoker.as_ref(), ctx.clone(), args).map_err(Failure::at(DispatchStage::Invoke))?;

        let mut content_type = None;
        let mut payload = Vec::new();
        if descriptor.output.is_some() {
            let accept = parts.headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());
            let mime = resolve_output_mime(accept, &descriptor.produces, &entry.service.produces);
            payload = self
                .encode(ctx, parts, &mime, output)
                .map_err(Failure::at(DispatchStage::Marshal))?;
            content_type = Some(mime);
        }

        let overrides = ctx.take_response_overrides();
        let status = overrides.status.unwrap_or_else(|| default_status(&descriptor.method));

        let mut compressed = false;
        if descriptor.gzip && !payload.is_empty() && accepts_gzip(&parts.headers) {
            match gzip(&payload) {
                Ok(bytes) => {
                    payload = bytes;
                    compressed = true;
                }
                Err(e) => error!(endpoint = %descriptor.operation_id, error = %e, "gzip failed, sending plain body"),
            }
        }

        let mut response = with_body(status, payload);
        let headers = response.headers_mut();
        headers.extend(overrides.headers);
        if let Some(value) = content_type.and_then(|mime| HeaderValue::from_str(&mime).ok()) {
            headers.insert(header::CONTENT_TYPE, value);
        }
        if compressed {
            headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
            headers.insert(header::VARY, HeaderValue::from_static("Accept-Encoding"));
        }
        Ok(response)
    }

    fn encode(&self, ctx: &RequestContext, parts: &Parts, mime: &str, output: Value) -> Result<Vec<u8>, HermesError> {
        let output = match &self.decorator {
            Some(decorator) => {
                let host = parts
                    .headers
                    .get(header::HOST)
                    .and_then(|v| v.to_str().ok())
                    .or_else(|| parts.uri.authority().map(|a| a.as_str()))
                    .unwrap_or_default();
                let base_url = format!("http://{host}");
                let scopes = ctx.granted_scopes();
                let decoration = Decoration {
                    mime,
                    base_url: &base_url,
                    scopes: &scopes,
                    context: ctx,
                };
                decorator.decorate(&decoration, output)?
            }
            None => output,
        };
        let marshaller = self
            .marshallers
            .get(mime)
            .ok_or_else(|| HermesError::internal(format!("no marshaller for {mime}")))?;
        marshaller
            .encode(&output)
            .map_err(|e| HermesError::internal_with_source(format!("failed to encode {mime} response"), e))
    }
}

fn invoke(invoker: &dyn Invoker, ctx: RequestContext, args: Vec<Arg>) -> Result<Value, HermesError> {
    match catch_unwind(AssertUnwindSafe(|| invoker.invoke(ctx, args))) {
        Ok(result) => result,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(HermesError::internal(format!("handler panicked: {message}")))
        }
    }
}

fn log_failure(failure: &Failure, parts: &Parts) {
    let status = failure.error.status_code();
    let method = &parts.method;
    let path = parts.uri.path();
    let stage = failure.stage;
    let error = &failure.error;
    if status.is_server_error() {
        error!(%method, path, %stage, %error, "request failed");
    } else if stage == DispatchStage::Route {
        warn!(%method, path, "no endpoint matches request");
    } else if stage == DispatchStage::Security {
        warn!(%method, path, %error, "request not authorized");
    } else {
        debug!(%method, path, %stage, %error, "request rejected");
    }
}

/// Strips the query part and the placeholder types from a signature.
fn clean_path(signature: &str) -> String {
    let path = signature.split('?').next().unwrap_or_default();
    let cleaned = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(inner) => format!("{{{}}}", inner.split(':').next().unwrap_or_default()),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/");
    format!("/{cleaned}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("api/users/{id:int}?{verbose:bool}"), "/api/users/{id}");
        assert_eq!(clean_path("files/{...:string}"), "/files/{...}");
        assert_eq!(clean_path(""), "/");
    }

    #[test]
    fn test_join_kinds() {
        use hermes_core::ScalarKind;
        let kinds = [ArgKind::Body, ArgKind::Scalar(ScalarKind::Int), ArgKind::List(ScalarKind::Str)];
        assert_eq!(join_kinds(&kinds), "Body<T>, i64, Vec<String>");
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(DispatchStage::Security.to_string(), "security");
        assert_eq!(DispatchStage::Marshal.to_string(), "marshal");
    }
}
