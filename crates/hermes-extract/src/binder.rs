//! Binding a matched request to handler arguments.

use crate::body::bind_body;
use crate::error::BindError;
use crate::marshal::MarshallerRegistry;
use crate::multipart::MultipartConfig;
use crate::negotiate::resolve_content_type;
use crate::path::bind_path_args;
use crate::query::{bind_query_args, QueryArgs};
use bytes::Bytes;
use hermes_core::Arg;
use hermes_router::RouteMatch;
use http::{header, HeaderMap, Uri};

/// The parts of a request that binding reads.
///
/// # Example
///
/// ```rust
/// use hermes_extract::BindContext;
///
/// let ctx = BindContext::builder()
///     .uri("/users/7?verbose=true")
///     .header("content-type", "application/json")
///     .body(r#"{"name":"ada"}"#)
///     .build();
///
/// assert_eq!(ctx.content_type(), Some("application/json"));
/// assert_eq!(ctx.uri().query(), Some("verbose=true"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BindContext {
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl BindContext {
    /// Creates a context from request parts.
    #[must_use]
    pub fn new(uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self { uri, headers, body }
    }

    /// Returns a builder, mostly useful in tests.
    #[must_use]
    pub fn builder() -> BindContextBuilder {
        BindContextBuilder::default()
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the `Content-Type` header if it is valid text.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

/// Builder for [`BindContext`].
#[derive(Debug, Default)]
pub struct BindContextBuilder {
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
}

impl BindContextBuilder {
    /// Sets the URI. An unparsable URI leaves the default `/`.
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.parse().ok();
        self
    }

    /// Adds a header. Invalid names or values are skipped.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> BindContext {
        BindContext {
            uri: self.uri.unwrap_or_default(),
            headers: self.headers,
            body: self.body,
        }
    }
}

/// Shared settings for binding.
#[derive(Debug, Clone, Default)]
pub struct BindOptions<'a> {
    /// Marshallers used to decode bodies.
    pub marshallers: Option<&'a MarshallerRegistry>,
    /// Limits for multipart bodies.
    pub multipart: MultipartConfig,
    /// The owning service's consumed MIME types.
    pub service_consumes: &'a [String],
    /// The request's query, when the caller has already parsed it.
    /// Otherwise it is parsed from the context's URI.
    pub query: Option<&'a QueryArgs>,
}

/// Binds a matched request to the handler's argument list:
/// `[body?, path args..., query args...]`, or `[body?, trailing list,
/// query args...]` for a variable-length endpoint.
///
/// The content type is only checked when the endpoint declares a body.
///
/// # Errors
///
/// Returns the first [`BindError`] in stage order: content type, body, path,
/// query. [`BindError::bind_source`] tells which stage failed.
pub async fn bind_arguments(
    ctx: &BindContext,
    route: &RouteMatch,
    options: &BindOptions<'_>,
) -> Result<Vec<Arg>, BindError> {
    let descriptor = &route.descriptor;
    let mut args = Vec::with_capacity(
        usize::from(descriptor.body.is_some()) + descriptor.path_params.len() + descriptor.query_params.len(),
    );

    if let Some(spec) = &descriptor.body {
        let content_type =
            resolve_content_type(ctx.content_type(), &descriptor.consumes, options.service_consumes)?;
        let defaults;
        let marshallers = match options.marshallers {
            Some(registry) => registry,
            None => {
                defaults = MarshallerRegistry::with_defaults();
                &defaults
            }
        };
        let value = bind_body(spec, &content_type, ctx.body.clone(), marshallers, &options.multipart).await?;
        args.push(Arg::Body(value));
    }

    args.extend(bind_path_args(descriptor, &route.params, &route.trailing)?);

    let parsed;
    let query = match options.query {
        Some(query) => query,
        None => {
            parsed = QueryArgs::from_uri(&ctx.uri)?;
            &parsed
        }
    };
    args.extend(bind_query_args(descriptor, query)?);
    Ok(args)
}
