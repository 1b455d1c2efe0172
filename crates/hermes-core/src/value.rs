//! Bound argument values and their conversion into handler parameters.
//!
//! The dispatcher binds every request into an ordered list of [`Arg`]s:
//! the body (if the endpoint declares one), then path parameters, then query
//! parameters. Handler parameters implement [`FromArg`] to take their value
//! out of that list. [`FromArg::kind`] is checked against the endpoint's
//! declaration when the endpoint is registered, so a mismatch fails at
//! startup instead of on the first request.

use crate::HermesError;
use serde::de::DeserializeOwned;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// A single converted path or query value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// A string.
    Str(String),
    /// A 64-bit integer (`int`, `int64`).
    Int(i64),
    /// A 32-bit integer.
    Int32(i32),
    /// A boolean.
    Bool(bool),
    /// A 32-bit float.
    Float32(f32),
    /// A 64-bit float.
    Float64(f64),
}

impl Scalar {
    /// Returns the kind of this scalar.
    #[must_use]
    pub const fn kind(&self) -> ScalarKind {
        match self {
            Self::Str(_) => ScalarKind::Str,
            Self::Int(_) => ScalarKind::Int,
            Self::Int32(_) => ScalarKind::Int32,
            Self::Bool(_) => ScalarKind::Bool,
            Self::Float32(_) => ScalarKind::Float32,
            Self::Float64(_) => ScalarKind::Float64,
        }
    }
}

/// The kind of a [`Scalar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// `String`
    Str,
    /// `i64`
    Int,
    /// `i32`
    Int32,
    /// `bool`
    Bool,
    /// `f32`
    Float32,
    /// `f64`
    Float64,
}

/// A bound argument, ready to be handed to a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A single path or query value.
    Scalar(Scalar),
    /// A list value (`[]string`, `[]int`, or variable-length trailing segments).
    List(Vec<Scalar>),
    /// A decoded request body.
    Body(serde_json::Value),
}

impl Arg {
    /// Returns the shape of this argument.
    #[must_use]
    pub fn kind(&self) -> ArgKind {
        match self {
            Self::Scalar(scalar) => ArgKind::Scalar(scalar.kind()),
            // An empty list carries no element kind; callers compare the
            // declared kind instead.
            Self::List(items) => ArgKind::List(items.first().map_or(ScalarKind::Str, Scalar::kind)),
            Self::Body(_) => ArgKind::Body,
        }
    }
}

/// The shape a handler parameter expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    /// A scalar of the given kind.
    Scalar(ScalarKind),
    /// A list whose elements have the given kind.
    List(ScalarKind),
    /// A request body.
    Body,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scalar = |kind: &ScalarKind| match kind {
            ScalarKind::Str => "String",
            ScalarKind::Int => "i64",
            ScalarKind::Int32 => "i32",
            ScalarKind::Bool => "bool",
            ScalarKind::Float32 => "f32",
            ScalarKind::Float64 => "f64",
        };
        match self {
            Self::Scalar(kind) => f.write_str(scalar(kind)),
            Self::List(kind) => write!(f, "Vec<{}>", scalar(kind)),
            Self::Body => f.write_str("Body<T>"),
        }
    }
}

/// Types a handler can accept as a parameter.
pub trait FromArg: Sized {
    /// The argument shape this type accepts.
    fn kind() -> ArgKind;

    /// Takes the value out of a bound argument.
    fn from_arg(arg: Arg) -> Result<Self, HermesError>;
}

fn mismatch(expected: ArgKind, arg: &Arg) -> HermesError {
    HermesError::internal(format!(
        "handler expects {expected} but the dispatcher bound {}",
        arg.kind()
    ))
}

macro_rules! scalar_arg {
    ($ty:ty, $variant:ident) => {
        impl FromArg for $ty {
            fn kind() -> ArgKind {
                ArgKind::Scalar(ScalarKind::$variant)
            }

            fn from_arg(arg: Arg) -> Result<Self, HermesError> {
                match arg {
                    Arg::Scalar(Scalar::$variant(value)) => Ok(value),
                    other => Err(mismatch(Self::kind(), &other)),
                }
            }
        }

        impl FromArg for Vec<$ty> {
            fn kind() -> ArgKind {
                ArgKind::List(ScalarKind::$variant)
            }

            fn from_arg(arg: Arg) -> Result<Self, HermesError> {
                match arg {
                    Arg::List(items) => items
                        .into_iter()
                        .map(|item| match item {
                            Scalar::$variant(value) => Ok(value),
                            other => Err(mismatch(Self::kind(), &Arg::Scalar(other))),
                        })
                        .collect(),
                    other => Err(mismatch(Self::kind(), &other)),
                }
            }
        }
    };
}

scalar_arg!(String, Str);
scalar_arg!(i64, Int);
scalar_arg!(i32, Int32);
scalar_arg!(bool, Bool);
scalar_arg!(f32, Float32);
scalar_arg!(f64, Float64);

/// A request body, decoded by the endpoint's consumed MIME type.
///
/// # Example
///
/// ```
/// use hermes_core::{Arg, Body, FromArg};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct NewUser {
///     name: String,
/// }
///
/// let arg = Arg::Body(serde_json::json!({"name": "ada"}));
/// let Body(user) = Body::<NewUser>::from_arg(arg).unwrap();
/// assert_eq!(user.name, "ada");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Body<T>(pub T);

impl<T> Body<T> {
    /// Consumes the wrapper, returning the decoded value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Body<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Body<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: DeserializeOwned> FromArg for Body<T> {
    fn kind() -> ArgKind {
        ArgKind::Body
    }

    /// A body that does not fit `T` is the client's fault, so this reports
    /// a bad request rather than an internal error.
    fn from_arg(arg: Arg) -> Result<Self, HermesError> {
        match arg {
            Arg::Body(value) => serde_json::from_value(value)
                .map(Body)
                .map_err(|e| HermesError::bad_request_for("body", format!("invalid request body: {e}"))),
            other => Err(mismatch(Self::kind(), &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_scalar_extraction() {
        assert_eq!(i64::from_arg(Arg::Scalar(Scalar::Int(42))).unwrap(), 42);
        assert_eq!(
            String::from_arg(Arg::Scalar(Scalar::Str("x".into()))).unwrap(),
            "x"
        );
        assert!(i32::from_arg(Arg::Scalar(Scalar::Int(1))).is_err());
    }

    #[test]
    fn test_list_extraction() {
        let arg = Arg::List(vec![Scalar::Str("a".into()), Scalar::Str("b".into())]);
        assert_eq!(Vec::<String>::from_arg(arg).unwrap(), vec!["a", "b"]);
        assert_eq!(Vec::<i64>::from_arg(Arg::List(Vec::new())).unwrap(), Vec::<i64>::new());
        assert_eq!(Vec::<i64>::kind(), ArgKind::List(ScalarKind::Int));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    #[test]
    fn test_body_decode_failure_is_bad_request() {
        let err = Body::<Item>::from_arg(Arg::Body(serde_json::json!({"id": "nope"}))).unwrap_err();
        assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_body_accepts_arrays_and_maps() {
        let Body(items) =
            Body::<Vec<Item>>::from_arg(Arg::Body(serde_json::json!([{"id": 1}, {"id": 2}]))).unwrap();
        assert_eq!(items.len(), 2);

        let Body(map) = Body::<std::collections::HashMap<String, Item>>::from_arg(Arg::Body(
            serde_json::json!({"a": {"id": 3}}),
        ))
        .unwrap();
        assert_eq!(map["a"], Item { id: 3 });
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ArgKind::List(ScalarKind::Int).to_string(), "Vec<i64>");
        assert_eq!(ArgKind::Body.to_string(), "Body<T>");
    }
}
