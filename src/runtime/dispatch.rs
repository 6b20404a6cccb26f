//! Helpers called by generated dispatch functions, and the registration
//! seam between generated code and a routing engine.
//!
//! Generated code never names parameter types. Every helper here is generic
//! over the value type and the handler call fixes it by inference.

use super::context::CallContext;
use super::error::{DispatchError, ParamSource};
use super::registry::{Converter, ConverterRegistry, ProviderRegistry};
use super::response::{HandlerResponse, Reply};
use futures::future::BoxFuture;
use http::{Method, StatusCode};
use serde::Serialize;
use std::any::type_name;
use std::sync::Arc;

/// Future produced by a dispatch unit.
pub type DispatchFuture = BoxFuture<'static, Result<HandlerResponse, DispatchError>>;

/// A registered route: takes the request context, produces the response.
pub type DispatchUnit = Arc<dyn Fn(CallContext) -> DispatchFuture + Send + Sync>;

/// Signature of a generated per-route dispatch function.
pub type DispatchFn =
    fn(CallContext, Arc<ConverterRegistry>, Arc<ProviderRegistry>) -> DispatchFuture;

/// Anything generated routes can be registered against.
pub trait RouteRegistrar {
    fn register(&mut self, method: Method, path: &str, unit: DispatchUnit);
}

/// Close a generated dispatch function over the frozen registries.
#[must_use]
pub fn dispatch_unit(
    converters: &Arc<ConverterRegistry>,
    providers: &Arc<ProviderRegistry>,
    dispatch: DispatchFn,
) -> DispatchUnit {
    let converters = Arc::clone(converters);
    let providers = Arc::clone(providers);
    Arc::new(move |ctx| dispatch(ctx, Arc::clone(&converters), Arc::clone(&providers)))
}

/// Resolve a `#[provided]` value of type `T`.
pub async fn provide<T: 'static>(
    providers: &ProviderRegistry,
    ctx: &CallContext,
) -> Result<T, DispatchError> {
    let provider = providers
        .get::<T>()
        .ok_or(DispatchError::MissingProvider {
            type_name: type_name::<T>(),
        })?;
    Ok(provider.provide(ctx).await)
}

/// A required text parameter through the registry converter for `T`.
///
/// The converter is looked up first, so a missing registration is reported
/// even when the value is absent.
pub fn convert_param<T: 'static>(
    converters: &ConverterRegistry,
    raw: Option<&str>,
    name: &'static str,
    location: ParamSource,
) -> Result<T, DispatchError> {
    let converter = registered::<T>(converters)?;
    convert_param_with(&*converter, raw, name, location)
}

/// An optional text parameter through the registry converter for `T`.
/// Absent or unconvertible values yield `None`.
pub fn convert_optional_param<T: 'static>(
    converters: &ConverterRegistry,
    raw: Option<&str>,
) -> Result<Option<T>, DispatchError> {
    let converter = registered::<T>(converters)?;
    Ok(convert_optional_param_with(&*converter, raw))
}

/// A required text parameter through an explicitly named converter.
pub fn convert_param_with<T, C>(
    converter: &C,
    raw: Option<&str>,
    name: &'static str,
    location: ParamSource,
) -> Result<T, DispatchError>
where
    C: Converter<T> + ?Sized,
{
    raw.and_then(|raw| converter.from_string(raw))
        .ok_or(DispatchError::MissingOrInvalidParameter { name, location })
}

/// An optional text parameter through an explicitly named converter.
pub fn convert_optional_param_with<T, C>(converter: &C, raw: Option<&str>) -> Option<T>
where
    C: Converter<T> + ?Sized,
{
    raw.and_then(|raw| converter.from_string(raw))
}

fn registered<T: 'static>(converters: &ConverterRegistry) -> Result<Arc<dyn Converter<T>>, DispatchError> {
    converters.get::<T>().ok_or(DispatchError::MissingConverter {
        type_name: type_name::<T>(),
    })
}

/// 200 with an empty body, for unit handlers.
pub fn respond_empty() -> Result<HandlerResponse, DispatchError> {
    Ok(HandlerResponse::empty(StatusCode::OK))
}

/// 200 with the serialized value as body.
pub fn respond<T: Serialize>(value: T) -> Result<HandlerResponse, DispatchError> {
    let body = serde_json::to_value(value)?;
    Ok(HandlerResponse::from_value(StatusCode::OK, body))
}

/// The reply's status, with its payload as body when present.
pub fn respond_reply<T: Serialize>(reply: Reply<T>) -> Result<HandlerResponse, DispatchError> {
    match reply.data {
        Some(data) => {
            let body = serde_json::to_value(data)?;
            Ok(HandlerResponse::from_value(reply.status, body))
        }
        None => Ok(HandlerResponse::empty(reply.status)),
    }
}
