//! The token dictionary shared by the compiler and the matcher.
//!
//! Every literal path segment (and every method name) seen at registration
//! time gets a numeric code. Placeholder type classes have fixed codes of
//! their own, drawn from a range literals never use, so a literal segment
//! spelled `string` or `int` can never collide with a type token.

use hermes_core::TypeClass;
use std::collections::HashMap;

/// Code reserved for the boolean placeholder class.
const BOOL_TOKEN: u32 = 1;
/// Code reserved for the integer placeholder class.
const INT_TOKEN: u32 = 2;
/// Code reserved for the string placeholder class.
const STRING_TOKEN: u32 = 3;
/// First code handed out to literals.
const FIRST_LITERAL_TOKEN: u32 = 16;

/// Maps literal segments to numeric codes.
///
/// The dictionary only grows. It is mutated while endpoints are registered
/// and read concurrently afterwards, so registration takes `&mut` and
/// matching takes `&`.
///
/// # Example
///
/// ```rust
/// use hermes_core::TypeClass;
/// use hermes_router::TokenDictionary;
///
/// let mut dict = TokenDictionary::new();
/// let users = dict.intern("users");
/// assert_eq!(dict.intern("users"), users);
/// assert_eq!(dict.literal("users"), Some(users));
/// assert_ne!(dict.intern("string"), TokenDictionary::class_token(TypeClass::String));
/// ```
#[derive(Debug, Clone)]
pub struct TokenDictionary {
    literals: HashMap<String, u32>,
    next: u32,
}

impl Default for TokenDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenDictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            literals: HashMap::new(),
            next: FIRST_LITERAL_TOKEN,
        }
    }

    /// Returns the fixed code of a placeholder class.
    #[must_use]
    pub const fn class_token(class: TypeClass) -> u32 {
        match class {
            TypeClass::Bool => BOOL_TOKEN,
            TypeClass::Int => INT_TOKEN,
            TypeClass::String => STRING_TOKEN,
        }
    }

    /// Returns the code of `segment`, assigning the next free one if it is new.
    pub fn intern(&mut self, segment: &str) -> u32 {
        if let Some(&code) = self.literals.get(segment) {
            return code;
        }
        let code = self.next;
        self.next += 1;
        self.literals.insert(segment.to_string(), code);
        code
    }

    /// Returns the code of a known literal without growing the dictionary.
    #[must_use]
    pub fn literal(&self, segment: &str) -> Option<u32> {
        self.literals.get(segment).copied()
    }

    /// Returns `true` if `segment` was registered as a literal.
    #[must_use]
    pub fn contains(&self, segment: &str) -> bool {
        self.literals.contains_key(segment)
    }

    /// Returns the number of literals known.
    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// Returns `true` if no literal has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable_and_monotonic() {
        let mut dict = TokenDictionary::new();
        let a = dict.intern("a");
        let b = dict.intern("b");
        assert!(b > a);
        assert_eq!(dict.intern("a"), a);
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_lookup_does_not_grow() {
        let dict = TokenDictionary::new();
        assert_eq!(dict.literal("missing"), None);
        assert!(dict.is_empty());
    }

    #[test]
    fn test_type_names_as_literals_stay_disjoint() {
        let mut dict = TokenDictionary::new();
        let classes = [TypeClass::Bool, TypeClass::Int, TypeClass::String];
        for name in ["bool", "int", "string", "int64"] {
            let code = dict.intern(name);
            for class in classes {
                assert_ne!(code, TokenDictionary::class_token(class));
            }
        }
    }
}
