//! Scope templates.

use hermes_router::Params;

/// Replaces every `{name}` in a scope with the matched path value for
/// `name`. Unknown names and unterminated braces are replaced by nothing.
///
/// ```rust
/// use hermes_authz::interpolate_scope;
/// use hermes_router::Params;
///
/// let mut params = Params::new();
/// params.push("id", "42");
/// assert_eq!(interpolate_scope("read[{id}]", &params), "read[42]");
/// assert_eq!(interpolate_scope("read[{owner}]", &params), "read[]");
/// assert_eq!(interpolate_scope("admin", &params), "admin");
/// ```
#[must_use]
pub fn interpolate_scope(scope: &str, params: &Params) -> String {
    let mut out = String::with_capacity(scope.len());
    let mut rest = scope;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return out;
        };
        out.push_str(params.get(&after[..close]).unwrap_or_default());
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Interpolates every scope of a requirement.
#[must_use]
pub fn interpolate_scopes(scopes: &[String], params: &Params) -> Vec<String> {
    scopes.iter().map(|scope| interpolate_scope(scope, params)).collect()
}
