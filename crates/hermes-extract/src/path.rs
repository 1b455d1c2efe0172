//! Path decoding and path argument binding.

use crate::error::{BindError, BindSource};
use hermes_core::Arg;
use hermes_router::{EndpointDescriptor, Params};
use percent_encoding::percent_decode_str;

/// Checks that every `%` starts a two-digit hex escape.
pub(crate) fn validate_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// Splits a request path into non-empty, percent-decoded segments.
///
/// Segments are split before decoding, so an encoded `%2F` stays inside its
/// segment. Broken escapes and escapes that decode to invalid UTF-8 are
/// rejected.
///
/// ```rust
/// use hermes_extract::decode_path;
///
/// assert_eq!(decode_path("/files/a%20b//c%2Fd").unwrap(), vec!["files", "a b", "c/d"]);
/// assert!(decode_path("/files/%zz").is_err());
/// ```
pub fn decode_path(path: &str) -> Result<Vec<String>, BindError> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if !validate_escapes(segment) {
                return Err(BindError::malformed(
                    BindSource::Path,
                    format!("invalid percent escape in {segment:?}"),
                ));
            }
            percent_decode_str(segment)
                .decode_utf8()
                .map(|decoded| decoded.into_owned())
                .map_err(|_| {
                    BindError::malformed(BindSource::Path, format!("{segment:?} is not valid UTF-8"))
                })
        })
        .collect()
}

/// Converts a match's raw path values to arguments in declaration order.
///
/// A variable-length endpoint binds one list built from the trailing
/// segments.
pub fn bind_path_args(
    descriptor: &EndpointDescriptor,
    params: &Params,
    trailing: &[String],
) -> Result<Vec<Arg>, BindError> {
    if descriptor.variable_length {
        let Some(param) = descriptor.path_params.first() else {
            return Ok(Vec::new());
        };
        let element = param.param_type.element();
        let items = trailing
            .iter()
            .map(|segment| element.convert_scalar(segment))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BindError::invalid_type(BindSource::Path, &param.name, e.to_string()))?;
        return Ok(vec![Arg::List(items)]);
    }

    descriptor
        .path_params
        .iter()
        .map(|param| {
            let raw = params.get(&param.name).unwrap_or_default();
            param
                .param_type
                .convert(raw)
                .map_err(|e| BindError::invalid_type(BindSource::Path, &param.name, e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::Scalar;
    use hermes_router::{EndpointDeclaration, Router, ServiceDescriptor};
    use http::Method;

    fn router(path: &str) -> Router {
        let mut router = Router::new();
        let decl = EndpointDeclaration {
            name: "ep".into(),
            method: "GET".into(),
            path: path.into(),
            ..Default::default()
        };
        router.register(&ServiceDescriptor::new("svc", "/"), &decl).unwrap();
        router
    }

    #[test]
    fn test_validate_escapes() {
        assert!(validate_escapes("a%2Fb"));
        assert!(validate_escapes("plain"));
        assert!(!validate_escapes("a%2"));
        assert!(!validate_escapes("%g0"));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        assert!(decode_path("/x/%ff").is_err());
    }

    #[test]
    fn test_bind_typed_path_args() {
        let router = router("/orgs/{org:string}/users/{id:int32}");
        let found = router.match_route(&Method::GET, "/orgs/acme/users/7").unwrap();
        let args = bind_path_args(&found.descriptor, &found.params, &found.trailing).unwrap();
        assert_eq!(
            args,
            vec![Arg::Scalar(Scalar::Str("acme".into())), Arg::Scalar(Scalar::Int32(7))]
        );
    }

    #[test]
    fn test_bind_path_conversion_failure() {
        let router = router("/big/{n:int32}");
        let found = router.match_route(&Method::GET, "/big/99999999999").unwrap();
        let err = bind_path_args(&found.descriptor, &found.params, &found.trailing).unwrap_err();
        assert_eq!(err.field(), Some("n"));
    }

    #[test]
    fn test_bind_variable_length() {
        let router = router("/files/{...:string}");
        let found = router.match_route(&Method::GET, "/files/a/b/c").unwrap();
        let args = bind_path_args(&found.descriptor, &found.params, &found.trailing).unwrap();
        assert_eq!(
            args,
            vec![Arg::List(vec![
                Scalar::Str("a".into()),
                Scalar::Str("b".into()),
                Scalar::Str("c".into()),
            ])]
        );
    }

    #[test]
    fn test_bind_variable_length_keeps_element_type() {
        let r = router("/points/{...:float64}");
        let found = r.match_route(&Method::GET, "/points/1.5/2").unwrap();
        let args = bind_path_args(&found.descriptor, &found.params, &found.trailing).unwrap();
        assert_eq!(args, vec![Arg::List(vec![Scalar::Float64(1.5), Scalar::Float64(2.0)])]);

        let r = router("/flags/{...:bool}");
        let found = r.match_route(&Method::GET, "/flags/t/false").unwrap();
        let args = bind_path_args(&found.descriptor, &found.params, &found.trailing).unwrap();
        assert_eq!(args, vec![Arg::List(vec![Scalar::Bool(true), Scalar::Bool(false)])]);

        let r = router("/small/{...:int32}");
        let found = r.match_route(&Method::GET, "/small/3").unwrap();
        let args = bind_path_args(&found.descriptor, &found.params, &found.trailing).unwrap();
        assert_eq!(args, vec![Arg::List(vec![Scalar::Int32(3)])]);
    }

    #[test]
    fn test_bind_variable_length_ints() {
        let router = router("/ids/{...:[]int}");
        let found = router.match_route(&Method::GET, "/ids/1/x").unwrap();
        assert!(bind_path_args(&found.descriptor, &found.params, &found.trailing).is_err());
    }
}
