//! Marshallers convert between wire bytes and JSON values.
//!
//! Request bodies are decoded into a [`serde_json::Value`] and handed to the
//! handler's [`Body`](hermes_core::Body) parameter; handler output is
//! serialized to a value and encoded by the marshaller of the negotiated
//! response MIME type. Keeping the value in the middle lets every marshaller
//! serve every endpoint.

use crate::negotiate::{essence, MULTIPART_FORM_DATA};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// `application/json`
pub const APPLICATION_JSON: &str = "application/json";
/// `application/x-www-form-urlencoded`
pub const APPLICATION_FORM: &str = "application/x-www-form-urlencoded";
/// `text/plain`
pub const TEXT_PLAIN: &str = "text/plain";

/// A marshaller failed.
#[derive(Debug, Error)]
pub enum MarshalError {
    /// The bytes are not valid for the MIME type.
    #[error("decode failed: {0}")]
    Decode(String),
    /// The value cannot be represented in the MIME type.
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Converts bytes of one MIME type to and from JSON values.
pub trait Marshaller: Send + Sync + 'static {
    /// Decodes a request body. An empty body decodes to `null`.
    fn decode(&self, bytes: &[u8]) -> Result<Value, MarshalError>;

    /// Encodes a response value.
    fn encode(&self, value: &Value) -> Result<Vec<u8>, MarshalError>;
}

/// `application/json` via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMarshaller;

impl Marshaller for JsonMarshaller {
    fn decode(&self, bytes: &[u8]) -> Result<Value, MarshalError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(bytes).map_err(|e| MarshalError::Decode(e.to_string()))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, MarshalError> {
        serde_json::to_vec(value).map_err(|e| MarshalError::Encode(e.to_string()))
    }
}

/// `application/x-www-form-urlencoded` via `serde_urlencoded`.
///
/// Decoded forms are objects of strings; a repeated key becomes an array.
/// Only flat objects can be encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormMarshaller;

impl Marshaller for FormMarshaller {
    fn decode(&self, bytes: &[u8]) -> Result<Value, MarshalError> {
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_bytes(bytes).map_err(|e| MarshalError::Decode(e.to_string()))?;
        let mut object = Map::new();
        for (key, value) in pairs {
            match object.get_mut(&key) {
                None => {
                    object.insert(key, Value::String(value));
                }
                Some(Value::Array(items)) => items.push(Value::String(value)),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::String(value)]);
                }
            }
        }
        Ok(Value::Object(object))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, MarshalError> {
        let Value::Object(object) = value else {
            return Err(MarshalError::Encode("form bodies must be objects".into()));
        };
        let mut pairs = Vec::with_capacity(object.len());
        for (key, value) in object {
            match value {
                Value::Array(items) => {
                    for item in items {
                        pairs.push((key.as_str(), flat_text(item)?));
                    }
                }
                other => pairs.push((key.as_str(), flat_text(other)?)),
            }
        }
        serde_urlencoded::to_string(pairs)
            .map(String::into_bytes)
            .map_err(|e| MarshalError::Encode(e.to_string()))
    }
}

fn flat_text(value: &Value) -> Result<String, MarshalError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Bool(_) | Value::Number(_) => Ok(value.to_string()),
        Value::Array(_) | Value::Object(_) => {
            Err(MarshalError::Encode("nested values cannot be form encoded".into()))
        }
    }
}

/// `text/plain`: bodies decode to a string; scalars encode as their text,
/// structured values as JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextMarshaller;

impl Marshaller for TextMarshaller {
    fn decode(&self, bytes: &[u8]) -> Result<Value, MarshalError> {
        std::str::from_utf8(bytes)
            .map(|text| Value::String(text.to_string()))
            .map_err(|e| MarshalError::Decode(e.to_string()))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, MarshalError> {
        let text = match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Ok(text.into_bytes())
    }
}

/// MIME type to marshaller registry.
///
/// Lookups use the MIME essence (parameters such as `charset` are ignored)
/// and fall back to JSON for any `json`-family type such as
/// `application/vnd.api+json`.
///
/// # Example
///
/// ```rust
/// use hermes_extract::MarshallerRegistry;
///
/// let registry = MarshallerRegistry::with_defaults();
/// assert!(registry.get("application/json; charset=utf-8").is_some());
/// assert!(registry.get("application/problem+json").is_some());
/// assert!(registry.get("application/xml").is_none());
/// assert!(registry.supports("multipart/form-data"));
/// ```
#[derive(Clone, Default)]
pub struct MarshallerRegistry {
    marshallers: HashMap<String, Arc<dyn Marshaller>>,
}

impl fmt::Debug for MarshallerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut mimes: Vec<_> = self.marshallers.keys().collect();
        mimes.sort();
        f.debug_struct("MarshallerRegistry").field("mimes", &mimes).finish()
    }
}

impl MarshallerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the JSON, form and text marshallers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(APPLICATION_JSON, JsonMarshaller);
        registry.register(APPLICATION_FORM, FormMarshaller);
        registry.register(TEXT_PLAIN, TextMarshaller);
        registry
    }

    /// Registers a marshaller. The first registration for a MIME type wins;
    /// returns `false` if one was already present.
    pub fn register(&mut self, mime: &str, marshaller: impl Marshaller) -> bool {
        self.register_arc(mime, Arc::new(marshaller))
    }

    /// Registers a shared marshaller.
    pub fn register_arc(&mut self, mime: &str, marshaller: Arc<dyn Marshaller>) -> bool {
        let key = essence(mime);
        if self.marshallers.contains_key(&key) {
            return false;
        }
        self.marshallers.insert(key, marshaller);
        true
    }

    /// Returns the marshaller for a MIME type.
    #[must_use]
    pub fn get(&self, mime: &str) -> Option<Arc<dyn Marshaller>> {
        let key = essence(mime);
        if let Some(marshaller) = self.marshallers.get(&key) {
            return Some(Arc::clone(marshaller));
        }
        if key.contains("json") {
            return self.marshallers.get(APPLICATION_JSON).cloned();
        }
        None
    }

    /// Returns `true` if requests or responses of this MIME type can be
    /// handled. Multipart bodies are parsed directly and need no marshaller.
    #[must_use]
    pub fn supports(&self, mime: &str) -> bool {
        essence(mime) == MULTIPART_FORM_DATA || self.get(mime).is_some()
    }
}
