//! Type-erased handler invocation.

use hermes_core::{Arg, ArgKind, Endpoint, HermesError, RequestContext, Service};
use serde_json::Value;
use std::marker::PhantomData;

/// A registered handler with its service type erased.
pub(crate) trait Invoker: Send + Sync + 'static {
    /// The handler's parameter kinds.
    fn arg_kinds(&self) -> Vec<ArgKind>;

    /// Builds a service instance for this request and calls the handler.
    fn invoke(&self, ctx: RequestContext, args: Vec<Arg>) -> Result<Value, HermesError>;
}

pub(crate) struct TypedInvoker<S, E, Args> {
    endpoint: E,
    _marker: PhantomData<fn() -> (S, Args)>,
}

impl<S, E, Args> TypedInvoker<S, E, Args> {
    pub(crate) fn new(endpoint: E) -> Self {
        Self {
            endpoint,
            _marker: PhantomData,
        }
    }
}

impl<S, E, Args> Invoker for TypedInvoker<S, E, Args>
where
    S: Service,
    E: Endpoint<S, Args>,
    Args: 'static,
{
    fn arg_kinds(&self) -> Vec<ArgKind> {
        E::arg_kinds()
    }

    fn invoke(&self, ctx: RequestContext, args: Vec<Arg>) -> Result<Value, HermesError> {
        let service = S::instantiate(ctx);
        self.endpoint.call(&service, args)
    }
}
