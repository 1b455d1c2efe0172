//! Compiles endpoint declarations into descriptors.

use crate::descriptor::{
    EndpointDeclaration, EndpointDescriptor, Param, SecurityRequirement, ServiceDescriptor,
    VARIABLE_LENGTH_PARAM,
};
use crate::dictionary::TokenDictionary;
use crate::error::ValidationError;
use crate::method::parse_method;
use crate::signature::{encode_registration, split_path};
use hermes_core::{ParamType, TypeSpec};
use std::collections::BTreeMap;

/// Validates a declaration and builds its descriptor, interning its
/// literals in `dict`.
///
/// Checks that need the other endpoints (duplicates, overlapping roots)
/// happen when the descriptor is inserted into a
/// [`RouteTable`](crate::RouteTable).
///
/// # Example
///
/// ```rust
/// use hermes_router::{compile, EndpointDeclaration, ServiceDescriptor, TokenDictionary};
///
/// let mut dict = TokenDictionary::new();
/// let service = ServiceDescriptor::new("users", "/api/users");
/// let decl = EndpointDeclaration {
///     name: "get".into(),
///     method: "GET".into(),
///     path: "/{id:int}?{verbose:bool}".into(),
///     output: Some("User".into()),
///     ..Default::default()
/// };
///
/// let descriptor = compile(&mut dict, &service, &decl).unwrap();
/// assert_eq!(descriptor.root, "api/users");
/// assert_eq!(descriptor.segment_count, 3);
/// assert_eq!(descriptor.path_params[0].position, 2);
/// assert_eq!(descriptor.query_params[0].name, "verbose");
/// ```
pub fn compile(
    dict: &mut TokenDictionary,
    service: &ServiceDescriptor,
    decl: &EndpointDeclaration,
) -> Result<EndpointDescriptor, ValidationError> {
    let endpoint = decl.name.clone();
    if decl.method.trim().is_empty() {
        return Err(ValidationError::MissingMethod { endpoint });
    }
    let method = parse_method(&decl.method).ok_or_else(|| ValidationError::UnknownMethod {
        endpoint: endpoint.clone(),
        method: decl.method.clone(),
    })?;
    if decl.path.trim().is_empty() {
        return Err(ValidationError::MissingPath { endpoint });
    }

    let signature = join_signature(&service.root, &decl.path);
    let (path_part, query_part) = match signature.split_once('?') {
        Some((path, query)) => (path.trim_end_matches('/'), Some(query)),
        None => (signature.as_str(), None),
    };

    let query_params = match query_part {
        Some(query) => parse_query(&signature, query)?,
        None => Vec::new(),
    };
    let layout = parse_path(&signature, path_part)?;

    let body = parse_type(&endpoint, "body", decl.body.as_deref())?;
    let output = parse_type(&endpoint, "output", decl.output.as_deref())?;

    let security = decl
        .security
        .iter()
        .map(|entry| {
            SecurityRequirement::parse(entry).ok_or_else(|| ValidationError::MalformedSecurity {
                endpoint: endpoint.clone(),
                value: entry.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let key = encode_registration(dict, &method, path_part);

    Ok(EndpointDescriptor {
        operation_id: format!("{}.{}", service.name, decl.name),
        name: decl.name.clone(),
        method,
        signature: signature.clone(),
        root: layout.root,
        segment_count: layout.segment_count,
        literals: layout.literals,
        path_params: layout.params,
        query_params,
        variable_length: layout.variable_length,
        body,
        output,
        security,
        consumes: normalize_mimes(&decl.consumes),
        produces: normalize_mimes(&decl.produces),
        gzip: decl.gzip.unwrap_or(service.gzip),
        key,
    })
}

/// Joins a service root and an endpoint path without leading or trailing
/// slashes.
fn join_signature(root: &str, path: &str) -> String {
    let root = root.trim_matches('/');
    let path = path.trim_matches('/');
    match (root.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (false, true) => root.to_string(),
        (false, false) => format!("{root}/{path}"),
    }
}

struct PathLayout {
    root: String,
    segment_count: usize,
    literals: BTreeMap<usize, String>,
    params: Vec<Param>,
    variable_length: bool,
}

fn parse_path(signature: &str, path: &str) -> Result<PathLayout, ValidationError> {
    let segments: Vec<&str> = split_path(path).collect();
    let mut layout = PathLayout {
        root: String::new(),
        segment_count: segments.len(),
        literals: BTreeMap::new(),
        params: Vec::new(),
        variable_length: false,
    };
    let mut root_len = None;

    for (position, segment) in segments.iter().enumerate() {
        let Some((name, param_type)) = parse_placeholder(signature, segment)? else {
            layout.literals.insert(position, (*segment).to_string());
            continue;
        };
        root_len.get_or_insert(position);

        if name == VARIABLE_LENGTH_PARAM {
            if position + 1 != segments.len() {
                return Err(ValidationError::VariableLengthNotLast {
                    signature: signature.to_string(),
                });
            }
            layout.variable_length = true;
        } else if layout.params.iter().any(|param| param.name == name) {
            return Err(ValidationError::DuplicatePathParam {
                signature: signature.to_string(),
                name,
            });
        }
        layout.params.push(Param {
            position,
            name,
            param_type,
        });
    }

    if layout.variable_length && layout.params.len() > 1 {
        return Err(ValidationError::VariableLengthParams {
            signature: signature.to_string(),
        });
    }

    let root_len = root_len.unwrap_or(segments.len());
    layout.root = segments[..root_len].join("/");
    Ok(layout)
}

fn parse_query(signature: &str, query: &str) -> Result<Vec<Param>, ValidationError> {
    let mut params: Vec<Param> = Vec::new();
    for entry in query.split('&').map(str::trim).filter(|entry| !entry.is_empty()) {
        let malformed = || ValidationError::MalformedQueryParam {
            signature: signature.to_string(),
            entry: entry.to_string(),
        };
        let (name, param_type) = parse_placeholder(signature, entry)?.ok_or_else(malformed)?;
        if name == VARIABLE_LENGTH_PARAM {
            return Err(malformed());
        }
        if params.iter().any(|param| param.name == name) {
            return Err(ValidationError::DuplicateQueryParam {
                signature: signature.to_string(),
                name,
            });
        }
        params.push(Param {
            position: params.len(),
            name,
            param_type,
        });
    }
    Ok(params)
}

/// Parses `{name:type}`; returns `None` for literal segments.
fn parse_placeholder(
    signature: &str,
    segment: &str,
) -> Result<Option<(String, ParamType)>, ValidationError> {
    let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
        return Ok(None);
    };
    let malformed = || ValidationError::MalformedPlaceholder {
        signature: signature.to_string(),
        segment: segment.to_string(),
    };
    let (name, type_name) = inner.split_once(':').ok_or_else(malformed)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(malformed());
    }
    let param_type =
        ParamType::parse(type_name).ok_or_else(|| ValidationError::UnsupportedParamType {
            signature: signature.to_string(),
            type_name: type_name.to_string(),
        })?;
    Ok(Some((name.to_string(), param_type)))
}

fn parse_type(
    endpoint: &str,
    position: &'static str,
    decl: Option<&str>,
) -> Result<Option<TypeSpec>, ValidationError> {
    decl.map(|decl| {
        TypeSpec::parse(decl).map_err(|source| ValidationError::InvalidType {
            endpoint: endpoint.to_string(),
            position,
            source,
        })
    })
    .transpose()
}

fn normalize_mimes(mimes: &[String]) -> Vec<String> {
    mimes
        .iter()
        .map(|mime| mime.trim().to_ascii_lowercase())
        .filter(|mime| !mime.is_empty())
        .collect()
}
