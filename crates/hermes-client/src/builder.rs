//! One-shot outbound requests.

use crate::error::{ClientError, ClientResult};
use bytes::Bytes;
use hermes_extract::{MarshallerRegistry, APPLICATION_JSON};
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

fn shared_client() -> ClientResult<Client> {
    if let Some(client) = SHARED_CLIENT.get() {
        return Ok(client.clone());
    }
    let client = Client::builder().build()?;
    Ok(SHARED_CLIENT.get_or_init(|| client).clone())
}

/// Status, headers and decoded body of a response.
#[derive(Debug, Clone)]
pub struct Reply<T> {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Decoded body.
    pub body: T,
}

/// Builds and sends a single request.
///
/// Every send method consumes the builder, so one builder is never shared
/// between callers; the pooled [`Client`] underneath is.
///
/// ```rust,no_run
/// use hermes_client::RequestBuilder;
/// use http::StatusCode;
/// use serde_json::Value;
///
/// # async fn run() -> Result<(), hermes_client::ClientError> {
/// let user: Value = RequestBuilder::new("http://localhost:8080/users/42")?
///     .header("authorization", "Bearer token")?
///     .get(StatusCode::OK)
///     .await?
///     .body;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    client: Client,
    url: Url,
    content_type: String,
    headers: HeaderMap,
    marshallers: MarshallerRegistry,
}

impl RequestBuilder {
    /// Targets `url` through the process-wide pooled client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL does not parse.
    pub fn new(url: &str) -> ClientResult<Self> {
        Self::from_client(shared_client()?, url)
    }

    /// Targets `url` through the given client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL does not parse.
    pub fn from_client(client: Client, url: &str) -> ClientResult<Self> {
        let url = Url::parse(url).map_err(|e| ClientError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            url,
            content_type: APPLICATION_JSON.to_string(),
            headers: HeaderMap::new(),
            marshallers: MarshallerRegistry::with_defaults(),
        })
    }

    /// Returns the target URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the content type used for bodies.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Sets the content type used to encode request bodies and to decode
    /// responses that do not name a supported one. Defaults to
    /// `application/json`.
    #[must_use]
    pub fn use_content_type(mut self, mime: impl Into<String>) -> Self {
        self.content_type = mime.into();
        self
    }

    /// Replaces the marshallers.
    #[must_use]
    pub fn marshallers(mut self, registry: MarshallerRegistry) -> Self {
        self.marshallers = registry;
        self
    }

    /// Appends a header.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidHeader`] for an invalid name or value.
    pub fn header(mut self, name: &str, value: &str) -> ClientResult<Self> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| ClientError::InvalidHeader(name.to_string()))?;
        let value = HeaderValue::from_str(value).map_err(|_| ClientError::InvalidHeader(name.to_string()))?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Adds a cookie to the `Cookie` header.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidHeader`] if the pair is not a valid
    /// header value.
    pub fn cookie(mut self, name: &str, value: &str) -> ClientResult<Self> {
        let pair = format!("{name}={value}");
        let joined = match self.headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
            Some(existing) => format!("{existing}; {pair}"),
            None => pair,
        };
        let value = HeaderValue::from_str(&joined).map_err(|_| ClientError::InvalidHeader(header::COOKIE.to_string()))?;
        self.headers.insert(header::COOKIE, value);
        Ok(self)
    }

    /// Sends a GET and decodes the body when the status is `expecting`.
    ///
    /// # Errors
    ///
    /// [`ClientError::UnexpectedStatus`] for any other status; transport and
    /// decoding failures otherwise.
    pub async fn get<T: DeserializeOwned>(self, expecting: StatusCode) -> ClientResult<Reply<T>> {
        let marshallers = self.marshallers.clone();
        let fallback = self.content_type.clone();
        let (status, headers, bytes) = self.send(Method::GET, None).await?;
        if status != expecting {
            return Err(unexpected(status, &bytes));
        }
        let body = decode(&marshallers, &headers, &fallback, &bytes)?;
        Ok(Reply { status, headers, body })
    }

    /// Sends a POST with an encoded body and ignores the response body.
    ///
    /// # Errors
    ///
    /// Encoding and transport failures.
    pub async fn post<B: Serialize + ?Sized>(self, body: &B) -> ClientResult<Reply<()>> {
        let encoded = self.encode(body)?;
        let (status, headers, _) = self.send(Method::POST, Some(encoded)).await?;
        Ok(Reply {
            status,
            headers,
            body: (),
        })
    }

    /// Sends a POST and decodes a non-empty success body.
    ///
    /// # Errors
    ///
    /// [`ClientError::UnexpectedStatus`] for a non-success status; encoding,
    /// transport and decoding failures otherwise.
    pub async fn post_with_response<B, T>(self, body: &B) -> ClientResult<Reply<Option<T>>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.exchange(Method::POST, body).await
    }

    /// Sends a PUT and decodes a non-empty success body.
    ///
    /// # Errors
    ///
    /// Same as [`post_with_response`](Self::post_with_response).
    pub async fn put<B, T>(self, body: &B) -> ClientResult<Reply<Option<T>>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.exchange(Method::PUT, body).await
    }

    /// Sends a DELETE.
    ///
    /// # Errors
    ///
    /// Transport failures.
    pub async fn delete(self) -> ClientResult<Reply<()>> {
        self.bodiless(Method::DELETE).await
    }

    /// Sends a HEAD.
    ///
    /// # Errors
    ///
    /// Transport failures.
    pub async fn head(self) -> ClientResult<Reply<()>> {
        self.bodiless(Method::HEAD).await
    }

    /// Sends an OPTIONS and returns the methods listed in `Allow`.
    ///
    /// # Errors
    ///
    /// Transport failures.
    pub async fn options(self) -> ClientResult<Vec<String>> {
        let (_, headers, _) = self.send(Method::OPTIONS, None).await?;
        Ok(headers
            .get_all(header::ALLOW)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|method| !method.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    async fn bodiless(self, method: Method) -> ClientResult<Reply<()>> {
        let (status, headers, _) = self.send(method, None).await?;
        Ok(Reply {
            status,
            headers,
            body: (),
        })
    }

    async fn exchange<B, T>(self, method: Method, body: &B) -> ClientResult<Reply<Option<T>>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let encoded = self.encode(body)?;
        let marshallers = self.marshallers.clone();
        let fallback = self.content_type.clone();
        let (status, headers, bytes) = self.send(method, Some(encoded)).await?;
        if !status.is_success() {
            return Err(unexpected(status, &bytes));
        }
        let body = if bytes.is_empty() {
            None
        } else {
            Some(decode(&marshallers, &headers, &fallback, &bytes)?)
        };
        Ok(Reply { status, headers, body })
    }

    fn encode<B: Serialize + ?Sized>(&self, body: &B) -> ClientResult<Vec<u8>> {
        let marshaller = self
            .marshallers
            .get(&self.content_type)
            .ok_or_else(|| ClientError::UnsupportedMime(self.content_type.clone()))?;
        let value = serde_json::to_value(body)?;
        Ok(marshaller.encode(&value)?)
    }

    async fn send(self, method: Method, body: Option<Vec<u8>>) -> ClientResult<(StatusCode, HeaderMap, Bytes)> {
        let mut request = self.client.request(method.clone(), self.url.clone()).headers(self.headers);
        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE, self.content_type.as_str())
                .body(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        debug!(%method, url = %self.url, status = status.as_u16(), "outbound request completed");
        Ok((status, headers, bytes))
    }
}

fn decode<T: DeserializeOwned>(
    marshallers: &MarshallerRegistry,
    headers: &HeaderMap,
    fallback: &str,
    bytes: &[u8],
) -> ClientResult<T> {
    let marshaller = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|mime| marshallers.get(mime))
        .or_else(|| marshallers.get(fallback))
        .ok_or_else(|| ClientError::UnsupportedMime(fallback.to_string()))?;
    let value = marshaller.decode(bytes)?;
    Ok(serde_json::from_value(value)?)
}

fn unexpected(status: StatusCode, bytes: &[u8]) -> ClientError {
    ClientError::UnexpectedStatus {
        status,
        body: String::from_utf8_lossy(bytes).into_owned(),
    }
}
