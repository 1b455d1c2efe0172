//! Signature encoding.
//!
//! A signature is `"<count> <token> <token> ... "`: the number of tokens,
//! then the method's token followed by one token per non-empty path
//! segment. Registration encodes declared paths, growing the dictionary for
//! new literals and using class tokens for placeholders. Requests encode
//! concrete paths against the frozen dictionary.

use crate::dictionary::TokenDictionary;
use hermes_core::{ParamType, TypeClass};
use http::Method;
use std::fmt::{self, Write};

/// An encoded signature, used as the exact-match key of the route table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EncodedSignature(String);

impl EncodedSignature {
    /// Returns the encoded form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_tokens(tokens: &[u32]) -> Self {
        let mut encoded = String::with_capacity(4 + tokens.len() * 4);
        // Writing to a String cannot fail.
        let _ = write!(encoded, "{} ", tokens.len());
        for token in tokens {
            let _ = write!(encoded, "{token} ");
        }
        Self(encoded)
    }
}

impl fmt::Display for EncodedSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How request segments unknown to the dictionary are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownSegments {
    /// Integer first, then boolean, otherwise string.
    Classify,
    /// Always string.
    ForceString,
}

/// Splits a path into its non-empty segments.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Returns the class of a `{name:type}` placeholder segment, or `None` for
/// literals. Placeholders with an unknown type encode as strings; the
/// compiler rejects them before they are ever encoded.
#[must_use]
pub fn placeholder_class(segment: &str) -> Option<TypeClass> {
    let inner = segment.strip_prefix('{')?.strip_suffix('}')?;
    let class = inner
        .split_once(':')
        .and_then(|(_, ty)| ParamType::parse(ty))
        .map_or(TypeClass::String, |ty| ty.match_class());
    Some(class)
}

/// Encodes a declared path, interning every new literal.
pub fn encode_registration(dict: &mut TokenDictionary, method: &Method, path: &str) -> EncodedSignature {
    let mut tokens = vec![dict.intern(method.as_str())];
    for segment in split_path(path) {
        let token = match placeholder_class(segment) {
            Some(class) => TokenDictionary::class_token(class),
            None => dict.intern(segment),
        };
        tokens.push(token);
    }
    EncodedSignature::from_tokens(&tokens)
}

/// Encodes a request's decoded path segments without touching the dictionary.
pub fn encode_request<S: AsRef<str>>(
    dict: &TokenDictionary,
    method: &Method,
    segments: &[S],
    unknown: UnknownSegments,
) -> EncodedSignature {
    let mut tokens = Vec::with_capacity(segments.len() + 1);
    tokens.push(classify(dict, method.as_str(), unknown));
    tokens.extend(segments.iter().map(|segment| classify(dict, segment.as_ref(), unknown)));
    EncodedSignature::from_tokens(&tokens)
}

fn classify(dict: &TokenDictionary, segment: &str, unknown: UnknownSegments) -> u32 {
    if let Some(code) = dict.literal(segment) {
        return code;
    }
    let class = match unknown {
        UnknownSegments::ForceString => TypeClass::String,
        UnknownSegments::Classify => TypeClass::classify(segment),
    };
    TokenDictionary::class_token(class)
}
