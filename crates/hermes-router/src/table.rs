//! The route table and the matcher.

use crate::descriptor::EndpointDescriptor;
use crate::dictionary::TokenDictionary;
use crate::error::ValidationError;
use crate::params::Params;
use crate::signature::{encode_request, split_path, EncodedSignature, UnknownSegments};
use crate::{MatchPass, RouteMatch};
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

/// Registered endpoints, indexed three ways.
///
/// - by encoded signature, for the two hash-lookup passes
/// - by `(method, segment count)`, for the shape scan that catches values
///   colliding with a literal declared elsewhere or of the wrong type
/// - by `(method, root)` for variable-length endpoints
///
/// The table is filled before serving starts and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    exact: HashMap<EncodedSignature, Arc<EndpointDescriptor>>,
    shapes: HashMap<(Method, usize), Vec<Arc<EndpointDescriptor>>>,
    variable: HashMap<(Method, String), Arc<EndpointDescriptor>>,
    endpoints: Vec<Arc<EndpointDescriptor>>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a compiled descriptor.
    ///
    /// Rejects a signature that is already registered, an endpoint with the
    /// same method, root, length and literals as an existing one, and any
    /// variable-length endpoint whose root is a prefix of another endpoint's
    /// root for the same method (or the other way around).
    pub fn insert(
        &mut self,
        descriptor: EndpointDescriptor,
    ) -> Result<Arc<EndpointDescriptor>, ValidationError> {
        if let Some(existing) = self.exact.get(&descriptor.key) {
            return Err(ValidationError::DuplicateSignature {
                method: descriptor.method.to_string(),
                signature: descriptor.signature.clone(),
                existing: existing.signature.clone(),
            });
        }

        for existing in self.endpoints.iter().filter(|e| e.method == descriptor.method) {
            if existing.root == descriptor.root
                && existing.segment_count == descriptor.segment_count
                && existing.literals == descriptor.literals
            {
                return Err(ValidationError::AmbiguousSignature {
                    method: descriptor.method.to_string(),
                    signature: descriptor.signature.clone(),
                    existing: existing.signature.clone(),
                });
            }
            if (descriptor.variable_length || existing.variable_length)
                && roots_overlap(&existing.root, &descriptor.root)
            {
                return Err(ValidationError::VariableRootOverlap {
                    method: descriptor.method.to_string(),
                    root: descriptor.root.clone(),
                    existing: existing.root.clone(),
                });
            }
        }

        let descriptor = Arc::new(descriptor);
        self.exact.insert(descriptor.key.clone(), Arc::clone(&descriptor));
        self.shapes
            .entry((descriptor.method.clone(), descriptor.segment_count))
            .or_default()
            .push(Arc::clone(&descriptor));
        if descriptor.variable_length {
            self.variable.insert(
                (descriptor.method.clone(), descriptor.root.clone()),
                Arc::clone(&descriptor),
            );
        }
        self.endpoints.push(Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Matches a raw path. Segments are not percent-decoded; callers that
    /// serve HTTP should decode and use [`RouteTable::match_segments`].
    #[must_use]
    pub fn match_route(&self, dict: &TokenDictionary, method: &Method, path: &str) -> Option<RouteMatch> {
        let segments: Vec<&str> = split_path(path).collect();
        self.match_segments(dict, method, &segments)
    }

    /// Matches decoded path segments.
    ///
    /// Passes, in order:
    /// 1. exact signature, unknown segments classified as int, bool or string
    /// 2. exact signature, unknown segments forced to string
    /// 3. variable-length endpoints, longest root first, at least one
    ///    trailing segment
    /// 4. endpoints of the same method and length whose literals match,
    ///    preferring one whose placeholders parse, then the one with the
    ///    most literals; a value of the wrong type is left for binding to
    ///    reject
    #[must_use]
    pub fn match_segments<S: AsRef<str>>(
        &self,
        dict: &TokenDictionary,
        method: &Method,
        segments: &[S],
    ) -> Option<RouteMatch> {
        let passes = [
            (UnknownSegments::Classify, MatchPass::Exact),
            (UnknownSegments::ForceString, MatchPass::StringFallback),
        ];
        for (unknown, pass) in passes {
            let key = encode_request(dict, method, segments, unknown);
            if let Some(descriptor) = self.exact.get(&key) {
                return Some(build_match(descriptor, segments, pass));
            }
        }

        for split in (0..segments.len()).rev() {
            let root = join_segments(&segments[..split]);
            if let Some(descriptor) = self.variable.get(&(method.clone(), root)) {
                return Some(build_match(descriptor, segments, MatchPass::VariableLength));
            }
        }

        let candidates: Vec<&Arc<EndpointDescriptor>> = self
            .shapes
            .get(&(method.clone(), segments.len()))?
            .iter()
            .filter(|descriptor| !descriptor.variable_length && descriptor.literals_match(segments))
            .collect();
        let typed = candidates
            .iter()
            .copied()
            .filter(|descriptor| descriptor.placeholders_parse(segments));
        most_specific(typed)
            .or_else(|| most_specific(candidates.iter().copied()))
            .map(|descriptor| build_match(descriptor, segments, MatchPass::Shape))
    }

    /// Returns all registered endpoints in registration order.
    #[must_use]
    pub fn endpoints(&self) -> &[Arc<EndpointDescriptor>] {
        &self.endpoints
    }

    /// Returns the number of registered endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns true if no endpoint is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

fn roots_overlap(a: &str, b: &str) -> bool {
    let a = format!("{a}/");
    let b = format!("{b}/");
    a.starts_with(&b) || b.starts_with(&a)
}

/// The candidate with the most literals; the earliest registered on a tie.
fn most_specific<'a>(
    candidates: impl Iterator<Item = &'a Arc<EndpointDescriptor>>,
) -> Option<&'a Arc<EndpointDescriptor>> {
    candidates.fold(None, |best: Option<&'a Arc<EndpointDescriptor>>, descriptor| match best {
        Some(best) if best.literals.len() >= descriptor.literals.len() => Some(best),
        _ => Some(descriptor),
    })
}

fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    let mut joined = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            joined.push('/');
        }
        joined.push_str(segment.as_ref());
    }
    joined
}

fn build_match<S: AsRef<str>>(
    descriptor: &Arc<EndpointDescriptor>,
    segments: &[S],
    pass: MatchPass,
) -> RouteMatch {
    let mut params = Params::with_capacity(descriptor.path_params.len());
    let mut trailing = Vec::new();
    match descriptor.variable_offset() {
        Some(offset) => {
            trailing = segments[offset..]
                .iter()
                .map(|segment| segment.as_ref().to_string())
                .collect();
            if let Some(param) = descriptor.path_params.first() {
                params.push(param.name.clone(), trailing.join("/"));
            }
        }
        None => {
            for param in &descriptor.path_params {
                params.push(param.name.clone(), segments[param.position].as_ref());
            }
        }
    }
    RouteMatch {
        descriptor: Arc::clone(descriptor),
        params,
        trailing,
        pass,
    }
}
