//! Scheme and authorizer registry.

use crate::authorizer::{AuthorizationRequest, Authorizer};
use crate::error::{AuthzError, AuthzResult};
use crate::scheme::SecurityScheme;
use crate::scope::interpolate_scopes;
use hermes_core::RequestContext;
use hermes_extract::QueryArgs;
use hermes_router::{EndpointDescriptor, Params, ValidationError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Security schemes and the authorizers that evaluate them, keyed by scheme
/// name. For both maps the first registration wins.
///
/// # Example
///
/// ```rust
/// use hermes_authz::{AllowAll, AuthorizerRegistry, SecurityScheme};
///
/// let mut registry = AuthorizerRegistry::new();
/// registry.register_scheme("oauth", SecurityScheme::oauth2());
/// registry.register_authorizer("oauth", AllowAll);
/// assert!(registry.scheme("oauth").is_some());
/// assert!(!registry.register_authorizer("oauth", |_: &hermes_authz::AuthorizationRequest<'_>| false));
/// ```
#[derive(Clone, Default)]
pub struct AuthorizerRegistry {
    schemes: HashMap<String, SecurityScheme>,
    authorizers: HashMap<String, Arc<dyn Authorizer>>,
}

impl fmt::Debug for AuthorizerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut authorizers: Vec<_> = self.authorizers.keys().collect();
        authorizers.sort();
        f.debug_struct("AuthorizerRegistry")
            .field("schemes", &self.schemes)
            .field("authorizers", &authorizers)
            .finish()
    }
}

impl AuthorizerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a scheme. Returns `false` if the name was already defined.
    pub fn register_scheme(&mut self, name: impl Into<String>, scheme: SecurityScheme) -> bool {
        let name = name.into();
        if self.schemes.contains_key(&name) {
            return false;
        }
        self.schemes.insert(name, scheme);
        true
    }

    /// Registers the authorizer for a scheme. Returns `false` if one was
    /// already registered.
    pub fn register_authorizer(&mut self, scheme: impl Into<String>, authorizer: impl Authorizer) -> bool {
        let scheme = scheme.into();
        if self.authorizers.contains_key(&scheme) {
            return false;
        }
        self.authorizers.insert(scheme, Arc::new(authorizer));
        true
    }

    /// Returns a scheme definition.
    #[must_use]
    pub fn scheme(&self, name: &str) -> Option<&SecurityScheme> {
        self.schemes.get(name)
    }

    /// Returns the authorizer registered for a scheme.
    #[must_use]
    pub fn authorizer(&self, scheme: &str) -> Option<Arc<dyn Authorizer>> {
        self.authorizers.get(scheme).cloned()
    }

    /// Checks that every scheme an endpoint requires is defined and has an
    /// authorizer.
    pub fn validate(&self, descriptor: &EndpointDescriptor) -> Result<(), ValidationError> {
        for requirement in &descriptor.security {
            let missing = if !self.schemes.contains_key(&requirement.scheme) {
                "scheme definition"
            } else if !self.authorizers.contains_key(&requirement.scheme) {
                "authorizer"
            } else {
                continue;
            };
            return Err(ValidationError::UnknownSecurityScheme {
                endpoint: descriptor.operation_id.clone(),
                scheme: requirement.scheme.clone(),
                missing,
            });
        }
        Ok(())
    }

    /// Runs the endpoint's security requirements in declaration order and
    /// returns the name of the first scheme that authorizes the request.
    ///
    /// Each scheme receives its own credential and its scopes interpolated
    /// with the matched path values. Unsecured endpoints pass with `None`.
    ///
    /// # Errors
    ///
    /// [`AuthzError::Denied`] when no scheme authorizes the request.
    pub fn authorize(
        &self,
        descriptor: &EndpointDescriptor,
        params: &Params,
        query: &QueryArgs,
        context: &RequestContext,
    ) -> AuthzResult<Option<String>> {
        if !descriptor.is_secured() {
            return Ok(None);
        }
        for requirement in &descriptor.security {
            let (Some(scheme), Some(authorizer)) = (
                self.schemes.get(&requirement.scheme),
                self.authorizers.get(&requirement.scheme),
            ) else {
                return Err(AuthzError::UnknownScheme {
                    scheme: requirement.scheme.clone(),
                });
            };
            let credential = scheme.extract_credential(context.headers(), query);
            let scopes = interpolate_scopes(&requirement.scopes, params);
            let request = AuthorizationRequest {
                credential: &credential,
                scheme: &requirement.scheme,
                scopes: &scopes,
                method: context.method(),
                context,
            };
            if authorizer.authorize(&request) {
                debug!(
                    endpoint = %descriptor.operation_id,
                    scheme = %requirement.scheme,
                    "request authorized"
                );
                return Ok(Some(requirement.scheme.clone()));
            }
        }
        Err(AuthzError::denied(
            descriptor.operation_id.clone(),
            descriptor.security.iter().map(|r| r.scheme.clone()).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorizer::AllowAll;
    use hermes_router::{EndpointDeclaration, Router, ServiceDescriptor};
    use http::{HeaderMap, Method};
    use std::sync::Mutex;

    fn descriptor(security: &[&str]) -> (Router, Arc<EndpointDescriptor>) {
        let mut router = Router::new();
        let decl = EndpointDeclaration {
            name: "get".into(),
            method: "GET".into(),
            path: "/docs/{id:int}".into(),
            security: security.iter().map(ToString::to_string).collect(),
            ..Default::default()
        };
        let descriptor = router.register(&ServiceDescriptor::new("docs", "/"), &decl).unwrap();
        (router, descriptor)
    }

    fn context(token: Option<&str>) -> RequestContext {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            headers.insert("authorization", format!("Bearer {token}").parse().unwrap());
        }
        RequestContext::new(Method::GET, "/docs/42").with_headers(headers)
    }

    fn id_params() -> Params {
        let mut params = Params::new();
        params.push("id", "42");
        params
    }

    #[test]
    fn test_validate_reports_missing_pieces() {
        let (_, descriptor) = descriptor(&["oauth:[read]"]);
        let mut registry = AuthorizerRegistry::new();
        let err = registry.validate(&descriptor).unwrap_err();
        assert!(err.to_string().contains("scheme definition"));

        registry.register_scheme("oauth", SecurityScheme::oauth2());
        let err = registry.validate(&descriptor).unwrap_err();
        assert!(err.to_string().contains("authorizer"));

        registry.register_authorizer("oauth", AllowAll);
        assert!(registry.validate(&descriptor).is_ok());
    }

    #[test]
    fn test_scopes_are_interpolated_and_credential_passed() {
        let (_, descriptor) = descriptor(&["oauth:[read[{id}]]"]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let mut registry = AuthorizerRegistry::new();
        registry.register_scheme("oauth", SecurityScheme::oauth2());
        registry.register_authorizer("oauth", move |req: &AuthorizationRequest<'_>| {
            recorder
                .lock()
                .unwrap()
                .push((req.credential.to_string(), req.scopes.to_vec()));
            true
        });

        let granted = registry
            .authorize(&descriptor, &id_params(), &QueryArgs::default(), &context(Some("tok")))
            .unwrap();
        assert_eq!(granted.as_deref(), Some("oauth"));
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[("tok".to_string(), vec!["read[42]".to_string()])]
        );
    }

    #[test]
    fn test_any_scheme_suffices() {
        let (_, descriptor) = descriptor(&["oauth:[read]", "key"]);
        let mut registry = AuthorizerRegistry::new();
        registry.register_scheme("oauth", SecurityScheme::oauth2());
        registry.register_scheme("key", SecurityScheme::api_key_query("key"));
        registry.register_authorizer("oauth", |_: &AuthorizationRequest<'_>| false);
        registry.register_authorizer("key", |req: &AuthorizationRequest<'_>| req.credential == "k");

        let query = QueryArgs::parse("key=k").unwrap();
        let granted = registry
            .authorize(&descriptor, &id_params(), &query, &context(None))
            .unwrap();
        assert_eq!(granted.as_deref(), Some("key"));

        let err = registry
            .authorize(&descriptor, &id_params(), &QueryArgs::default(), &context(None))
            .unwrap_err();
        assert!(matches!(err, AuthzError::Denied { .. }));
    }

    #[test]
    fn test_unsecured_endpoint_passes() {
        let (_, descriptor) = descriptor(&[]);
        let registry = AuthorizerRegistry::new();
        assert_eq!(
            registry
                .authorize(&descriptor, &Params::new(), &QueryArgs::default(), &context(None))
                .unwrap(),
            None
        );
    }
}
