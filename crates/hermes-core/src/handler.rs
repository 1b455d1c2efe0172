//! Service and endpoint traits.
//!
//! A [`Service`] is a type whose methods implement endpoints. The dispatcher
//! builds a fresh instance for every request with [`Service::instantiate`],
//! then calls the matched method through [`Endpoint`], which is implemented
//! for every `Fn(&S, A1, .., An) -> Result<R, HermesError>` with
//! `Ai: FromArg` and `R: Serialize`, up to eight arguments.

use crate::{Arg, ArgKind, FromArg, HermesError, RequestContext};
use serde::Serialize;

/// A type whose methods are registered as endpoints.
///
/// # Example
///
/// ```
/// use hermes_core::{HermesError, RequestContext, Service};
///
/// struct Users {
///     ctx: RequestContext,
/// }
///
/// impl Service for Users {
///     fn instantiate(ctx: RequestContext) -> Self {
///         Self { ctx }
///     }
/// }
///
/// impl Users {
///     fn get(&self, id: i64) -> Result<String, HermesError> {
///         Ok(format!("{} asked for {id}", self.ctx.request_id()))
///     }
/// }
/// ```
pub trait Service: Send + Sync + 'static {
    /// Builds the instance that serves one request.
    fn instantiate(ctx: RequestContext) -> Self
    where
        Self: Sized;
}

/// A callable endpoint on service `S` taking the arguments `Args`.
///
/// `Args` is a tuple of the handler's parameter types; it only exists to
/// keep the per-arity implementations apart.
pub trait Endpoint<S, Args>: Send + Sync + 'static {
    /// The kinds of the handler's parameters, in order.
    fn arg_kinds() -> Vec<ArgKind>;

    /// Calls the handler and serializes what it returns.
    fn call(&self, service: &S, args: Vec<Arg>) -> Result<serde_json::Value, HermesError>;
}

fn serialize_output<R: Serialize>(output: R) -> Result<serde_json::Value, HermesError> {
    serde_json::to_value(output)
        .map_err(|e| HermesError::internal_with_source("failed to serialize handler output", e))
}

macro_rules! impl_endpoint {
    ($($ty:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<S, F, R, $($ty,)*> Endpoint<S, ($($ty,)*)> for F
        where
            F: Fn(&S, $($ty),*) -> Result<R, HermesError> + Send + Sync + 'static,
            R: Serialize,
            $($ty: FromArg,)*
        {
            fn arg_kinds() -> Vec<ArgKind> {
                vec![$($ty::kind()),*]
            }

            fn call(&self, service: &S, args: Vec<Arg>) -> Result<serde_json::Value, HermesError> {
                let expected = <Self as Endpoint<S, ($($ty,)*)>>::arg_kinds().len();
                if args.len() != expected {
                    return Err(HermesError::internal(format!(
                        "handler takes {expected} arguments, {} were bound",
                        args.len()
                    )));
                }
                let mut args = args.into_iter();
                $(
                    let $ty = match args.next() {
                        Some(arg) => $ty::from_arg(arg)?,
                        None => return Err(HermesError::internal("argument list ended early")),
                    };
                )*
                serialize_output((self)(service, $($ty),*)?)
            }
        }
    };
}

impl_endpoint!();
impl_endpoint!(A1);
impl_endpoint!(A1, A2);
impl_endpoint!(A1, A2, A3);
impl_endpoint!(A1, A2, A3, A4);
impl_endpoint!(A1, A2, A3, A4, A5);
impl_endpoint!(A1, A2, A3, A4, A5, A6);
impl_endpoint!(A1, A2, A3, A4, A5, A6, A7);
impl_endpoint!(A1, A2, A3, A4, A5, A6, A7, A8);
