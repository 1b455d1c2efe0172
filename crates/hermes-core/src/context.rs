//! Request context types.
//!
//! The [`RequestContext`] carries per-request state from the dispatcher into
//! authorizers and service instances. Clones share the same session
//! attributes and response overrides, so a value written by an authorizer is
//! visible to the service instance built afterwards, and a status set by a
//! handler is visible to the dispatcher when it writes the response.

use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Session attribute holding the scopes granted by the authorizer.
pub const SCOPE_ATTRIBUTE: &str = "Scope";

/// Session attribute holding the authenticated user's UUID.
pub const USER_UUID_ATTRIBUTE: &str = "UserUUID";

/// Session attribute holding the authenticated user's id.
pub const USER_ID_ATTRIBUTE: &str = "UserId";

/// Session attribute holding the request's `Host` header.
pub const HOST_ATTRIBUTE: &str = "Host";

/// A unique identifier for each request, using UUID v7.
///
/// # Example
///
/// ```
/// use hermes_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new time-ordered request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// String-keyed attributes attached to a request's session.
///
/// Authorizers record what they learned about the caller here (user id,
/// granted scopes); services read it back through their context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    attributes: HashMap<String, serde_json::Value>,
}

impl SessionData {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the attribute stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    /// Returns the attribute stored under `key` if it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(serde_json::Value::as_str)
    }

    /// Stores an attribute, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Removes an attribute.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.attributes.remove(key)
    }

    /// Returns the scopes recorded under [`SCOPE_ATTRIBUTE`].
    ///
    /// Accepts either a JSON array of strings or a single comma-separated
    /// string.
    #[must_use]
    pub fn granted_scopes(&self) -> Vec<String> {
        match self.attributes.get(SCOPE_ATTRIBUTE) {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(ToString::to_string))
                .collect(),
            Some(serde_json::Value::String(joined)) => joined
                .split(',')
                .map(str::trim)
                .filter(|scope| !scope.is_empty())
                .map(ToString::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns `true` if no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Response adjustments requested by a handler.
#[derive(Debug, Clone, Default)]
pub struct ResponseOverrides {
    /// Status code replacing the method's default success status.
    pub status: Option<StatusCode>,
    /// Extra headers written on the response.
    pub headers: HeaderMap,
}

/// Per-request context handed to authorizers and service instances.
///
/// # Example
///
/// ```
/// use hermes_core::RequestContext;
/// use http::{Method, StatusCode};
///
/// let ctx = RequestContext::new(Method::POST, "/users");
/// ctx.set_status(StatusCode::ACCEPTED);
/// assert_eq!(ctx.response_overrides().status, Some(StatusCode::ACCEPTED));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    path: String,
    headers: Arc<HeaderMap>,
    session: Arc<RwLock<SessionData>>,
    response: Arc<Mutex<ResponseOverrides>>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for a request with a fresh request ID.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            headers: Arc::new(HeaderMap::new()),
            session: Arc::new(RwLock::new(SessionData::new())),
            response: Arc::new(Mutex::new(ResponseOverrides::default())),
            started_at: Instant::now(),
        }
    }

    /// Creates a context for tests.
    #[must_use]
    pub fn mock() -> Self {
        Self::new(Method::GET, "/")
    }

    /// Returns a new context carrying the given request headers.
    ///
    /// The `Host` header, when present, is copied into the session under
    /// [`HOST_ATTRIBUTE`].
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        if let Some(host) = headers.get(http::header::HOST).and_then(|v| v.to_str().ok()) {
            self.session.write().set(HOST_ATTRIBUTE, host);
        }
        self.headers = Arc::new(headers);
        self
    }

    /// Returns a new context with the specified request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path as received.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a snapshot of the session attributes.
    #[must_use]
    pub fn session(&self) -> SessionData {
        self.session.read().clone()
    }

    /// Returns a single session attribute.
    #[must_use]
    pub fn session_attribute(&self, key: &str) -> Option<serde_json::Value> {
        self.session.read().get(key).cloned()
    }

    /// Stores a session attribute visible to every clone of this context.
    pub fn set_session_attribute(&self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.session.write().set(key, value);
    }

    /// Returns the scopes the authorizer granted for this request.
    #[must_use]
    pub fn granted_scopes(&self) -> Vec<String> {
        self.session.read().granted_scopes()
    }

    /// Returns the authenticated user's UUID, if an authorizer recorded one.
    #[must_use]
    pub fn user_uuid(&self) -> Option<String> {
        self.session
            .read()
            .get_str(USER_UUID_ATTRIBUTE)
            .map(ToString::to_string)
    }

    /// Overrides the response status code.
    pub fn set_status(&self, status: StatusCode) {
        self.response.lock().status = Some(status);
    }

    /// Adds a header to the response.
    pub fn insert_response_header(&self, name: HeaderName, value: HeaderValue) {
        self.response.lock().headers.insert(name, value);
    }

    /// Returns a copy of the response overrides.
    #[must_use]
    pub fn response_overrides(&self) -> ResponseOverrides {
        self.response.lock().clone()
    }

    /// Takes the response overrides, leaving defaults behind.
    pub fn take_response_overrides(&self) -> ResponseOverrides {
        std::mem::take(&mut *self.response.lock())
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::mock()
    }
}
