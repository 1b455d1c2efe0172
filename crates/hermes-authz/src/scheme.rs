//! Security scheme definitions and credential extraction.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hermes_extract::QueryArgs;
use http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

/// How a scheme transports its credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeMode {
    /// `Authorization: Basic <base64(user:password)>`
    Basic,
    /// A key in a named header or query parameter.
    ApiKey,
    /// `Authorization: Bearer <token>`
    #[serde(rename = "oauth2")]
    OAuth2,
}

/// Where an API key is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialLocation {
    /// A request header.
    #[default]
    Header,
    /// A query string parameter.
    Query,
}

/// A named security scheme endpoints can require.
///
/// # Example
///
/// ```rust
/// use hermes_authz::SecurityScheme;
/// use http::HeaderMap;
///
/// let scheme = SecurityScheme::api_key_header("X-Api-Key").with_prefix("Key ");
///
/// let mut headers = HeaderMap::new();
/// headers.insert("x-api-key", "Key s3cr3t".parse().unwrap());
/// assert_eq!(scheme.extract_credential(&headers, &Default::default()), "s3cr3t");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityScheme {
    /// Transport of the credential.
    pub mode: SchemeMode,
    /// Header or query parameter carrying an API key.
    #[serde(default)]
    pub location: CredentialLocation,
    /// Header or query parameter name.
    #[serde(default)]
    pub name: String,
    /// Prefix stripped from the raw value, e.g. `Bearer `.
    #[serde(default)]
    pub prefix: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

impl SecurityScheme {
    /// HTTP basic authentication.
    #[must_use]
    pub fn basic() -> Self {
        Self::with_mode(SchemeMode::Basic, CredentialLocation::Header, header::AUTHORIZATION.as_str(), "Basic ")
    }

    /// OAuth2 bearer tokens.
    #[must_use]
    pub fn oauth2() -> Self {
        Self::with_mode(SchemeMode::OAuth2, CredentialLocation::Header, header::AUTHORIZATION.as_str(), "Bearer ")
    }

    /// An API key in the named header.
    #[must_use]
    pub fn api_key_header(name: impl Into<String>) -> Self {
        Self::with_mode(SchemeMode::ApiKey, CredentialLocation::Header, name, "")
    }

    /// An API key in the named query parameter.
    #[must_use]
    pub fn api_key_query(name: impl Into<String>) -> Self {
        Self::with_mode(SchemeMode::ApiKey, CredentialLocation::Query, name, "")
    }

    fn with_mode(
        mode: SchemeMode,
        location: CredentialLocation,
        name: impl Into<String>,
        prefix: &str,
    ) -> Self {
        Self {
            mode,
            location,
            name: name.into(),
            prefix: prefix.to_string(),
            description: String::new(),
        }
    }

    /// Sets the prefix stripped from API keys.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns the credential the request presents for this scheme, or an
    /// empty string when none is present.
    ///
    /// Basic credentials are base64-decoded to `user:password`; a value that
    /// does not decode yields an empty credential. OAuth2 always reads the
    /// `Authorization` header and strips `Bearer `.
    #[must_use]
    pub fn extract_credential(&self, headers: &HeaderMap, query: &QueryArgs) -> String {
        match self.mode {
            SchemeMode::Basic => header_value(headers, header::AUTHORIZATION.as_str())
                .map(|raw| raw.strip_prefix("Basic ").unwrap_or(raw))
                .and_then(|encoded| STANDARD.decode(encoded.trim()).ok())
                .and_then(|decoded| String::from_utf8(decoded).ok())
                .unwrap_or_default(),
            SchemeMode::OAuth2 => header_value(headers, header::AUTHORIZATION.as_str())
                .map(|raw| strip(raw, "Bearer "))
                .unwrap_or_default(),
            SchemeMode::ApiKey => {
                let raw = match self.location {
                    CredentialLocation::Header => header_value(headers, &self.name),
                    CredentialLocation::Query => query.get(&self.name),
                };
                raw.map(|raw| strip(raw, &self.prefix)).unwrap_or_default()
            }
        }
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

fn strip(raw: &str, prefix: &str) -> String {
    raw.strip_prefix(prefix).unwrap_or(raw).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_basic_decodes_credentials() {
        let h = headers("authorization", &format!("Basic {}", STANDARD.encode("ada:pw")));
        assert_eq!(SecurityScheme::basic().extract_credential(&h, &QueryArgs::default()), "ada:pw");
    }

    #[test]
    fn test_basic_bad_base64_is_empty() {
        let h = headers("authorization", "Basic !!!");
        assert_eq!(SecurityScheme::basic().extract_credential(&h, &QueryArgs::default()), "");
    }

    #[test]
    fn test_oauth2_strips_bearer() {
        let h = headers("authorization", "Bearer abc.def");
        assert_eq!(SecurityScheme::oauth2().extract_credential(&h, &QueryArgs::default()), "abc.def");
    }

    #[test]
    fn test_api_key_from_query() {
        let query = QueryArgs::parse("token=k-1").unwrap();
        let scheme = SecurityScheme::api_key_query("token");
        assert_eq!(scheme.extract_credential(&HeaderMap::new(), &query), "k-1");
    }

    #[test]
    fn test_missing_credential_is_empty() {
        let scheme = SecurityScheme::api_key_header("X-Key");
        assert_eq!(scheme.extract_credential(&HeaderMap::new(), &QueryArgs::default()), "");
    }

    #[test]
    fn test_deserialize_scheme() {
        let scheme: SecurityScheme =
            serde_json::from_str(r#"{"mode":"api_key","location":"query","name":"key"}"#).unwrap();
        assert_eq!(scheme, SecurityScheme::api_key_query("key"));
        let oauth: SecurityScheme = serde_json::from_str(r#"{"mode":"oauth2"}"#).unwrap();
        assert_eq!(oauth.mode, SchemeMode::OAuth2);
    }
}
