//! The authorizer contract.

use hermes_core::RequestContext;
use http::Method;
use tracing::warn;

/// What an authorizer is asked to decide.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationRequest<'a> {
    /// The credential presented for the scheme, or `""` when none was sent.
    pub credential: &'a str,
    /// The scheme name being evaluated.
    pub scheme: &'a str,
    /// Required scopes, already interpolated with path values.
    pub scopes: &'a [String],
    /// The request method.
    pub method: &'a Method,
    /// The request context. Authorizers may record session attributes here,
    /// such as [`SCOPE_ATTRIBUTE`](hermes_core::SCOPE_ATTRIBUTE) and
    /// [`USER_UUID_ATTRIBUTE`](hermes_core::USER_UUID_ATTRIBUTE).
    pub context: &'a RequestContext,
}

/// Decides whether a credential satisfies a scheme's required scopes.
///
/// Closures of the right shape are authorizers:
///
/// ```rust
/// use hermes_authz::{AuthorizationRequest, Authorizer};
///
/// fn accepts<A: Authorizer>(_: A) {}
///
/// accepts(|req: &AuthorizationRequest<'_>| req.credential == "let-me-in");
/// ```
pub trait Authorizer: Send + Sync + 'static {
    /// Returns `true` to let the request through.
    fn authorize(&self, request: &AuthorizationRequest<'_>) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(&AuthorizationRequest<'_>) -> bool + Send + Sync + 'static,
{
    fn authorize(&self, request: &AuthorizationRequest<'_>) -> bool {
        self(request)
    }
}

/// Lets every request through and warns each time it does.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, request: &AuthorizationRequest<'_>) -> bool {
        warn!(scheme = request.scheme, "allow-all authorizer used");
        true
    }
}
