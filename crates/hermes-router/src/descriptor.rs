//! Endpoint declarations and the compiled descriptors built from them.

use crate::signature::EncodedSignature;
use hermes_core::{ArgKind, ParamType, TypeSpec};
use http::Method;
use std::collections::BTreeMap;

/// The name of the placeholder marking a variable-length endpoint.
pub const VARIABLE_LENGTH_PARAM: &str = "...";

/// A declared path or query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Segment index within the full path. Query parameters use their
    /// declaration order instead.
    pub position: usize,
    /// Parameter name.
    pub name: String,
    /// Declared type.
    pub param_type: ParamType,
}

/// A named security scheme plus the scopes an endpoint requires from it.
///
/// Scopes may reference path parameters, as in `read[{id}]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRequirement {
    /// Scheme name.
    pub scheme: String,
    /// Required scope templates.
    pub scopes: Vec<String>,
}

impl SecurityRequirement {
    /// Creates a requirement.
    #[must_use]
    pub fn new(scheme: impl Into<String>, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            scheme: scheme.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses the compact form `scheme` or `scheme:[scope, scope[{param}]]`.
    ///
    /// Commas nested inside brackets do not split scopes.
    ///
    /// ```rust
    /// use hermes_router::SecurityRequirement;
    ///
    /// let req = SecurityRequirement::parse("oauth2:[read[{id}],write]").unwrap();
    /// assert_eq!(req.scheme, "oauth2");
    /// assert_eq!(req.scopes, vec!["read[{id}]", "write"]);
    /// ```
    #[must_use]
    pub fn parse(decl: &str) -> Option<Self> {
        let decl = decl.trim();
        let (scheme, scopes) = match decl.split_once(':') {
            Some((scheme, rest)) => (scheme.trim(), Some(rest.trim())),
            None => (decl, None),
        };
        if scheme.is_empty() || scheme.contains('[') {
            return None;
        }
        let scopes = match scopes {
            None => Vec::new(),
            Some(list) => {
                let inner = list.strip_prefix('[')?.strip_suffix(']')?;
                split_scopes(inner)?
            }
        };
        Some(Self::new(scheme, scopes))
    }
}

fn split_scopes(list: &str) -> Option<Vec<String>> {
    let mut scopes = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for ch in list.chars() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                push_scope(&mut scopes, &current);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    if depth != 0 {
        return None;
    }
    push_scope(&mut scopes, &current);
    Some(scopes)
}

fn push_scope(scopes: &mut Vec<String>, scope: &str) {
    let scope = scope.trim();
    if !scope.is_empty() {
        scopes.push(scope.to_string());
    }
}

/// Settings a service applies to all of its endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Service name, used to build operation ids.
    pub name: String,
    /// Path prefix of every endpoint.
    pub root: String,
    /// Default consumed MIME types.
    pub consumes: Vec<String>,
    /// Default produced MIME types.
    pub produces: Vec<String>,
    /// Whether responses may be gzip-compressed by default.
    pub gzip: bool,
}

impl ServiceDescriptor {
    /// Creates a service mounted at `root` consuming and producing JSON.
    #[must_use]
    pub fn new(name: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            consumes: vec!["application/json".to_string()],
            produces: vec!["application/json".to_string()],
            gzip: false,
        }
    }
}

/// An endpoint as declared, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointDeclaration {
    /// Endpoint name, unique within its service.
    pub name: String,
    /// Request method name.
    pub method: String,
    /// Path template relative to the service root, with an optional
    /// `?{name:type}&{name:type}` query suffix.
    pub path: String,
    /// Output type, if the endpoint writes a response body.
    pub output: Option<String>,
    /// Body type, if the endpoint reads a request body.
    pub body: Option<String>,
    /// Security requirements in compact form; any one of them suffices.
    pub security: Vec<String>,
    /// Consumed MIME types overriding the service's.
    pub consumes: Vec<String>,
    /// Produced MIME types overriding the service's.
    pub produces: Vec<String>,
    /// Gzip override; `None` inherits the service default.
    pub gzip: Option<bool>,
}

/// A validated, registrable endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    /// `service.endpoint`, unique across the server.
    pub operation_id: String,
    /// Endpoint name.
    pub name: String,
    /// Request method.
    pub method: Method,
    /// Service root joined with the declared path, query suffix included.
    pub signature: String,
    /// Path segments before the first placeholder, joined with `/`.
    pub root: String,
    /// Number of non-empty path segments.
    pub segment_count: usize,
    /// Literal segments by position.
    pub literals: BTreeMap<usize, String>,
    /// Path parameters in path order.
    pub path_params: Vec<Param>,
    /// Query parameters in declaration order.
    pub query_params: Vec<Param>,
    /// Whether the last placeholder captures all remaining segments.
    pub variable_length: bool,
    /// Request body type.
    pub body: Option<TypeSpec>,
    /// Response body type.
    pub output: Option<TypeSpec>,
    /// Alternative security requirements.
    pub security: Vec<SecurityRequirement>,
    /// Accepted request MIME types (empty means the service's).
    pub consumes: Vec<String>,
    /// Produced response MIME types (empty means the service's).
    pub produces: Vec<String>,
    /// Whether responses may be gzip-compressed.
    pub gzip: bool,
    /// Exact-match key in the route table.
    pub key: EncodedSignature,
}

impl EndpointDescriptor {
    /// Returns the parameter kinds the handler must accept, in call order:
    /// body, then path parameters (or the trailing list), then query
    /// parameters.
    #[must_use]
    pub fn arg_kinds(&self) -> Vec<ArgKind> {
        let mut kinds = Vec::with_capacity(1 + self.path_params.len() + self.query_params.len());
        if self.body.is_some() {
            kinds.push(ArgKind::Body);
        }
        for param in &self.path_params {
            if self.variable_length {
                kinds.push(ArgKind::List(param.param_type.element_kind()));
            } else {
                kinds.push(param.param_type.arg_kind());
            }
        }
        kinds.extend(self.query_params.iter().map(|param| param.param_type.arg_kind()));
        kinds
    }

    /// Returns the number of leading segments a variable-length endpoint
    /// consumes before its trailing list.
    #[must_use]
    pub fn variable_offset(&self) -> Option<usize> {
        if self.variable_length {
            self.path_params.first().map(|param| param.position)
        } else {
            None
        }
    }

    /// Returns `true` if the decoded segments have this endpoint's length and
    /// literals. Placeholder values are not checked; binding converts them
    /// and rejects a value of the wrong type.
    #[must_use]
    pub fn literals_match<S: AsRef<str>>(&self, segments: &[S]) -> bool {
        segments.len() == self.segment_count
            && self
                .literals
                .iter()
                .all(|(&pos, literal)| segments[pos].as_ref() == literal)
    }

    /// Returns `true` if every placeholder value parses as its declared type.
    #[must_use]
    pub fn placeholders_parse<S: AsRef<str>>(&self, segments: &[S]) -> bool {
        self.path_params.iter().all(|param| {
            segments
                .get(param.position)
                .is_some_and(|raw| param.param_type.convert(raw.as_ref()).is_ok())
        })
    }

    /// Returns `true` if this endpoint declares security requirements.
    #[must_use]
    pub fn is_secured(&self) -> bool {
        !self.security.is_empty()
    }
}
