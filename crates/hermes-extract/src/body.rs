//! Request body binding.

use crate::error::BindError;
use crate::marshal::MarshallerRegistry;
use crate::multipart::{first_file_name, MultipartConfig};
use crate::negotiate::is_multipart;
use bytes::Bytes;
use hermes_core::{TypeModifier, TypeSpec};
use serde_json::Value;
use tracing::debug;

/// Decodes a request body into the value handed to the handler's body
/// argument.
///
/// Multipart bodies bind the first uploaded file's name. Everything else
/// goes through the marshaller registered for `content_type` and must fit
/// the declared modifier: `[]T` wants an array, `map[string]T` an object.
/// An empty body decodes to `null` and is left for the handler's argument
/// type to accept or reject.
///
/// # Errors
///
/// Returns a [`BindError`] when no marshaller handles the content type, the
/// bytes do not decode, or the decoded value has the wrong shape.
pub async fn bind_body(
    spec: &TypeSpec,
    content_type: &str,
    body: Bytes,
    registry: &MarshallerRegistry,
    multipart: &MultipartConfig,
) -> Result<Value, BindError> {
    if is_multipart(content_type) {
        let name = first_file_name(content_type, body, multipart).await?;
        if name.is_none() {
            debug!("multipart body carried no file part");
        }
        return Ok(name.map_or(Value::Null, Value::String));
    }

    let marshaller = registry.get(content_type).ok_or_else(|| {
        BindError::unsupported_media_type(&[], content_type)
    })?;
    let value = marshaller.decode(&body).map_err(|e| {
        debug!(content_type, error = %e, "request body did not decode");
        BindError::deserialization_failed(e.to_string())
    })?;
    check_shape(spec, &value)?;
    Ok(value)
}

fn check_shape(spec: &TypeSpec, value: &Value) -> Result<(), BindError> {
    let fits = match (spec.modifier(), value) {
        (_, Value::Null) | (TypeModifier::Scalar, _) => true,
        (TypeModifier::Array, Value::Array(_)) | (TypeModifier::Map, Value::Object(_)) => true,
        _ => false,
    };
    if fits {
        Ok(())
    } else {
        Err(BindError::deserialization_failed(format!(
            "expected {spec}, got {}",
            json_kind(value)
        )))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
