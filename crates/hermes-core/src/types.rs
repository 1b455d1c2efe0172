//! Declared types for path, query, body and output positions.
//!
//! Path and query placeholders use a closed set of [`ParamType`]s. Body and
//! output declarations use free-form [`TypeSpec`]s that only record whether
//! the payload is a single value, an array or a string-keyed map.

use crate::value::{Arg, ArgKind, Scalar, ScalarKind};
use std::fmt;
use thiserror::Error;

/// The types allowed on path and query placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// `string`
    String,
    /// `int`
    Int,
    /// `int32`
    Int32,
    /// `int64`
    Int64,
    /// `bool`
    Bool,
    /// `float32`
    Float32,
    /// `float64`
    Float64,
    /// `[]string`
    StringList,
    /// `[]int`
    IntList,
}

impl ParamType {
    /// Every accepted placeholder type name.
    pub const ALLOWED: [&'static str; 9] = [
        "string", "int", "int32", "int64", "bool", "float32", "float64", "[]string", "[]int",
    ];

    /// Parses a placeholder type name, ignoring ASCII case.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let ty = match name.trim().to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "int" => Self::Int,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "bool" => Self::Bool,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            "[]string" => Self::StringList,
            "[]int" => Self::IntList,
            _ => return None,
        };
        Some(ty)
    }

    /// Returns the canonical type name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Bool => "bool",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::StringList => "[]string",
            Self::IntList => "[]int",
        }
    }

    /// Returns the class this type occupies in route signatures.
    ///
    /// Integer types share one class, `bool` has its own, and everything
    /// else (floats and lists included) is matched as a string.
    #[must_use]
    pub const fn match_class(&self) -> TypeClass {
        match self {
            Self::Int | Self::Int32 | Self::Int64 => TypeClass::Int,
            Self::Bool => TypeClass::Bool,
            _ => TypeClass::String,
        }
    }

    /// Returns `true` for the comma-separated list types.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::StringList | Self::IntList)
    }

    /// Returns the element type of a list, or the type itself for scalars.
    #[must_use]
    pub const fn element(&self) -> Self {
        match self {
            Self::StringList => Self::String,
            Self::IntList => Self::Int,
            other => *other,
        }
    }

    /// Returns the scalar kind of this type, or of its element for lists.
    #[must_use]
    pub const fn element_kind(&self) -> ScalarKind {
        self.scalar_kind()
    }

    const fn scalar_kind(&self) -> ScalarKind {
        match self {
            Self::String | Self::StringList => ScalarKind::Str,
            Self::Int | Self::Int64 | Self::IntList => ScalarKind::Int,
            Self::Int32 => ScalarKind::Int32,
            Self::Bool => ScalarKind::Bool,
            Self::Float32 => ScalarKind::Float32,
            Self::Float64 => ScalarKind::Float64,
        }
    }

    /// Returns the argument kind a handler must accept for this type.
    #[must_use]
    pub const fn arg_kind(&self) -> ArgKind {
        if self.is_list() {
            ArgKind::List(self.scalar_kind())
        } else {
            ArgKind::Scalar(self.scalar_kind())
        }
    }

    /// Returns the zero value bound when the raw value is empty or absent.
    #[must_use]
    pub fn zero(&self) -> Arg {
        if self.is_list() {
            return Arg::List(Vec::new());
        }
        Arg::Scalar(match self.scalar_kind() {
            ScalarKind::Str => Scalar::Str(String::new()),
            ScalarKind::Int => Scalar::Int(0),
            ScalarKind::Int32 => Scalar::Int32(0),
            ScalarKind::Bool => Scalar::Bool(false),
            ScalarKind::Float32 => Scalar::Float32(0.0),
            ScalarKind::Float64 => Scalar::Float64(0.0),
        })
    }

    /// Converts a raw (already percent-decoded) string into an argument.
    ///
    /// An empty string yields [`ParamType::zero`]. List types split on
    /// commas and convert every element.
    pub fn convert(&self, raw: &str) -> Result<Arg, ConversionError> {
        if raw.is_empty() {
            return Ok(self.zero());
        }
        if self.is_list() {
            let element = self.element();
            let items = raw
                .split(',')
                .map(|item| element.convert_scalar(item))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Arg::List(items));
        }
        self.convert_scalar(raw).map(Arg::Scalar)
    }

    /// Converts a raw string into a single scalar of this type's element kind.
    pub fn convert_scalar(&self, raw: &str) -> Result<Scalar, ConversionError> {
        let fail = || ConversionError {
            value: raw.to_string(),
            expected: *self,
        };
        let scalar = match self.scalar_kind() {
            ScalarKind::Str => Scalar::Str(raw.to_string()),
            ScalarKind::Int => Scalar::Int(raw.parse().map_err(|_| fail())?),
            ScalarKind::Int32 => Scalar::Int32(raw.parse().map_err(|_| fail())?),
            ScalarKind::Bool => Scalar::Bool(parse_bool(raw).ok_or_else(fail)?),
            ScalarKind::Float32 => Scalar::Float32(raw.parse().map_err(|_| fail())?),
            ScalarKind::Float64 => Scalar::Float64(raw.parse().map_err(|_| fail())?),
        };
        Ok(scalar)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw value could not be converted to its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert {value:?} to {expected}")]
pub struct ConversionError {
    /// The offending raw value.
    pub value: String,
    /// The declared type.
    pub expected: ParamType,
}

/// Parses the boolean spellings used both for binding and for classifying
/// request segments.
///
/// `1` and `0` are deliberately rejected: they classify as integers.
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" | "True" | "TRUE" | "t" | "T" => Some(true),
        "false" | "False" | "FALSE" | "f" | "F" => Some(false),
        _ => None,
    }
}

/// The coarse classes route signatures distinguish placeholder values by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeClass {
    /// Booleans.
    Bool,
    /// Integers.
    Int,
    /// Anything else.
    String,
}

impl TypeClass {
    /// Classifies a request segment: integer first, then boolean, else string.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        if raw.parse::<i64>().is_ok() {
            Self::Int
        } else if parse_bool(raw).is_some() {
            Self::Bool
        } else {
            Self::String
        }
    }
}

/// Container shape of a body or output declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeModifier {
    /// A single value.
    Scalar,
    /// `[]T`
    Array,
    /// `map[string]T`
    Map,
}

/// A body or output type declaration such as `User`, `[]User` or
/// `map[string]User`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeSpec {
    name: String,
    modifier: TypeModifier,
}

impl TypeSpec {
    /// Parses a declaration. Maps must be keyed by `string`.
    pub fn parse(decl: &str) -> Result<Self, TypeSpecError> {
        let decl = decl.trim();
        if decl.is_empty() {
            return Err(TypeSpecError::Empty);
        }
        if let Some(element) = decl.strip_prefix("[]") {
            return Self::element(element, TypeModifier::Array, decl);
        }
        if let Some(rest) = decl.strip_prefix("map[") {
            let (key, element) = rest
                .split_once(']')
                .ok_or_else(|| TypeSpecError::Malformed(decl.to_string()))?;
            if key.trim() != "string" {
                return Err(TypeSpecError::NonStringMapKey(decl.to_string()));
            }
            return Self::element(element, TypeModifier::Map, decl);
        }
        Ok(Self {
            name: decl.to_string(),
            modifier: TypeModifier::Scalar,
        })
    }

    fn element(element: &str, modifier: TypeModifier, decl: &str) -> Result<Self, TypeSpecError> {
        let element = element.trim();
        if element.is_empty() {
            return Err(TypeSpecError::Malformed(decl.to_string()));
        }
        Ok(Self {
            name: element.to_string(),
            modifier,
        })
    }

    /// Returns the element type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the container shape.
    #[must_use]
    pub const fn modifier(&self) -> TypeModifier {
        self.modifier
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            TypeModifier::Scalar => f.write_str(&self.name),
            TypeModifier::Array => write!(f, "[]{}", self.name),
            TypeModifier::Map => write!(f, "map[string]{}", self.name),
        }
    }
}

/// A body or output declaration could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeSpecError {
    /// The declaration is blank.
    #[error("type declaration is empty")]
    Empty,
    /// The declaration is syntactically broken.
    #[error("malformed type declaration {0:?}")]
    Malformed(String),
    /// A map is keyed by something other than `string`.
    #[error("only string keyed maps (map[string]...) are allowed, got {0:?}")]
    NonStringMapKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allowed_types() {
        for name in ParamType::ALLOWED {
            let ty = ParamType::parse(name).expect("allowed type must parse");
            assert_eq!(ty.as_str(), name);
        }
        assert_eq!(ParamType::parse("INT64"), Some(ParamType::Int64));
        assert_eq!(ParamType::parse("uint8"), None);
        assert_eq!(ParamType::parse("[]bool"), None);
    }

    #[test]
    fn test_match_classes() {
        assert_eq!(ParamType::Int32.match_class(), TypeClass::Int);
        assert_eq!(ParamType::Int64.match_class(), TypeClass::Int);
        assert_eq!(ParamType::Bool.match_class(), TypeClass::Bool);
        assert_eq!(ParamType::Float64.match_class(), TypeClass::String);
        assert_eq!(ParamType::IntList.match_class(), TypeClass::String);
    }

    #[test]
    fn test_element_kinds() {
        assert_eq!(ParamType::Float64.element_kind(), ScalarKind::Float64);
        assert_eq!(ParamType::Int32.element_kind(), ScalarKind::Int32);
        assert_eq!(ParamType::IntList.element_kind(), ScalarKind::Int);
        assert_eq!(ParamType::StringList.element_kind(), ScalarKind::Str);
    }

    #[test]
    fn test_classify_order() {
        assert_eq!(TypeClass::classify("42"), TypeClass::Int);
        assert_eq!(TypeClass::classify("-7"), TypeClass::Int);
        assert_eq!(TypeClass::classify("1"), TypeClass::Int);
        assert_eq!(TypeClass::classify("T"), TypeClass::Bool);
        assert_eq!(TypeClass::classify("false"), TypeClass::Bool);
        assert_eq!(TypeClass::classify("4.5"), TypeClass::String);
        assert_eq!(TypeClass::classify("abc"), TypeClass::String);
    }

    #[test]
    fn test_convert_empty_yields_zero() {
        assert_eq!(ParamType::Int.convert("").unwrap(), Arg::Scalar(Scalar::Int(0)));
        assert_eq!(ParamType::Bool.convert("").unwrap(), Arg::Scalar(Scalar::Bool(false)));
        assert_eq!(ParamType::String.convert("").unwrap(), Arg::Scalar(Scalar::Str(String::new())));
        assert_eq!(ParamType::IntList.convert("").unwrap(), Arg::List(Vec::new()));
    }

    #[test]
    fn test_convert_lists_split_on_commas() {
        assert_eq!(
            ParamType::IntList.convert("1,2,3").unwrap(),
            Arg::List(vec![Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)])
        );
        assert_eq!(
            ParamType::StringList.convert("a,b").unwrap(),
            Arg::List(vec![Scalar::Str("a".into()), Scalar::Str("b".into())])
        );
        assert!(ParamType::IntList.convert("1,x").is_err());
    }

    #[test]
    fn test_convert_failures_name_the_type() {
        let err = ParamType::Int32.convert("99999999999").unwrap_err();
        assert_eq!(err.expected, ParamType::Int32);
        assert!(err.to_string().contains("int32"));
        assert!(ParamType::Bool.convert("1").is_err());
        assert!(ParamType::Float32.convert("1.5").is_ok());
    }

    #[test]
    fn test_type_spec_shapes() {
        let scalar = TypeSpec::parse("User").unwrap();
        assert_eq!(scalar.modifier(), TypeModifier::Scalar);

        let array = TypeSpec::parse("[]User").unwrap();
        assert_eq!(array.modifier(), TypeModifier::Array);
        assert_eq!(array.name(), "User");

        let map = TypeSpec::parse("map[string]User").unwrap();
        assert_eq!(map.modifier(), TypeModifier::Map);
        assert_eq!(map.to_string(), "map[string]User");
    }

    #[test]
    fn test_type_spec_rejects_non_string_keys() {
        assert_eq!(
            TypeSpec::parse("map[int]User"),
            Err(TypeSpecError::NonStringMapKey("map[int]User".into()))
        );
        assert!(matches!(TypeSpec::parse("map[string"), Err(TypeSpecError::Malformed(_))));
        assert_eq!(TypeSpec::parse("  "), Err(TypeSpecError::Empty));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn int_values_convert_exactly(n in any::<i64>()) {
                prop_assert_eq!(ParamType::Int64.convert(&n.to_string()).unwrap(), Arg::Scalar(Scalar::Int(n)));
                prop_assert_eq!(TypeClass::classify(&n.to_string()), TypeClass::Int);
            }

            #[test]
            fn int_lists_keep_order(items in proptest::collection::vec(any::<i64>(), 1..8)) {
                let raw = items.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
                let expected = items.into_iter().map(Scalar::Int).collect();
                prop_assert_eq!(ParamType::IntList.convert(&raw).unwrap(), Arg::List(expected));
            }

            #[test]
            fn strings_never_fail(raw in "[^,]{1,24}") {
                prop_assert_eq!(ParamType::String.convert(&raw).unwrap(), Arg::Scalar(Scalar::Str(raw.clone())));
            }
        }
    }
}
