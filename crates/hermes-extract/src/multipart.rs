//! Multipart form bodies.
//!
//! Endpoints that declare a body and consume `multipart/form-data` receive
//! the client-supplied file name of the first uploaded file as their body
//! argument. The remaining parts are read and discarded so that the limits
//! below still apply to the whole request.

use crate::error::{BindError, BindSource};
use bytes::Bytes;
use std::io;

/// Default maximum multipart body size (10 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Default maximum size of a single part (5 MiB).
pub const DEFAULT_MAX_FIELD_SIZE: usize = 5 * 1024 * 1024;

/// Default maximum number of parts.
pub const DEFAULT_MAX_FIELDS: usize = 100;

/// Limits applied while reading a multipart body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultipartConfig {
    /// Maximum total body size in bytes.
    pub max_body_size: usize,
    /// Maximum size of a single part in bytes.
    pub max_field_size: usize,
    /// Maximum number of parts.
    pub max_fields: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }
}

impl MultipartConfig {
    /// Creates a config with the default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum body size.
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Sets the maximum part size.
    #[must_use]
    pub fn max_field_size(mut self, size: usize) -> Self {
        self.max_field_size = size;
        self
    }

    /// Sets the maximum number of parts.
    #[must_use]
    pub fn max_fields(mut self, count: usize) -> Self {
        self.max_fields = count;
        self
    }
}

/// Reads a multipart body and returns the file name of the first part that
/// carries one, or `None` when no file was uploaded.
///
/// # Errors
///
/// Returns a [`BindError`] when the boundary is missing, the body exceeds a
/// limit, or the multipart framing is broken.
pub async fn first_file_name(
    content_type: &str,
    body: Bytes,
    config: &MultipartConfig,
) -> Result<Option<String>, BindError> {
    let boundary = multer::parse_boundary(content_type).map_err(|_| {
        BindError::malformed(
            BindSource::ContentType,
            "missing or invalid boundary in multipart content type",
        )
    })?;
    if body.len() > config.max_body_size {
        return Err(BindError::payload_too_large(config.max_body_size, body.len()));
    }

    let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
    let constraints = multer::Constraints::new().size_limit(
        multer::SizeLimit::new()
            .whole_stream(config.max_body_size as u64)
            .per_field(config.max_field_size as u64),
    );
    let mut multipart = multer::Multipart::with_constraints(stream, boundary, constraints);

    let mut file_name = None;
    let mut fields = 0usize;
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| BindError::deserialization_failed(format!("multipart parse error: {e}")))?;
        let Some(field) = field else {
            break;
        };
        fields += 1;
        if fields > config.max_fields {
            return Err(BindError::deserialization_failed(format!(
                "too many multipart fields (max {})",
                config.max_fields
            )));
        }
        if file_name.is_none() {
            file_name = field.file_name().map(ToString::to_string);
        }
        field
            .bytes()
            .await
            .map_err(|e| BindError::deserialization_failed(format!("multipart field error: {e}")))?;
    }
    Ok(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Bytes {
        let mut body = Vec::new();
        for (name, file_name, data) in parts {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        Bytes::from(body)
    }

    const CONTENT_TYPE: &str = "multipart/form-data; boundary=XyZ";

    #[test]
    fn test_config_builder() {
        let config = MultipartConfig::new().max_body_size(100).max_field_size(50).max_fields(2);
        assert_eq!(config.max_body_size, 100);
        assert_eq!(config.max_field_size, 50);
        assert_eq!(config.max_fields, 2);
        assert_eq!(MultipartConfig::default().max_fields, DEFAULT_MAX_FIELDS);
    }

    #[tokio::test]
    async fn test_first_file_name_skips_plain_fields() {
        let body = multipart_body(
            "XyZ",
            &[
                ("title", None, b"holiday"),
                ("upload", Some("beach.png"), b"\x89PNG"),
                ("other", Some("second.png"), b"\x89PNG"),
            ],
        );
        let name = first_file_name(CONTENT_TYPE, body, &MultipartConfig::default())
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("beach.png"));
    }

    #[tokio::test]
    async fn test_no_file_yields_none() {
        let body = multipart_body("XyZ", &[("title", None, b"holiday")]);
        let name = first_file_name(CONTENT_TYPE, body, &MultipartConfig::default())
            .await
            .unwrap();
        assert_eq!(name, None);
    }

    #[tokio::test]
    async fn test_missing_boundary() {
        let err = first_file_name("multipart/form-data", Bytes::new(), &MultipartConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.bind_source(), BindSource::ContentType);
    }

    #[tokio::test]
    async fn test_body_too_large() {
        let body = multipart_body("XyZ", &[("upload", Some("a.bin"), &[0u8; 64][..])]);
        let config = MultipartConfig::new().max_body_size(16);
        let err = first_file_name(CONTENT_TYPE, body, &config).await.unwrap_err();
        assert_eq!(err.error_code(), "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_too_many_fields() {
        let body = multipart_body("XyZ", &[("a", None, b"1"), ("b", None, b"2"), ("c", None, b"3")]);
        let config = MultipartConfig::new().max_fields(2);
        assert!(first_file_name(CONTENT_TYPE, body, &config).await.is_err());
    }
}
