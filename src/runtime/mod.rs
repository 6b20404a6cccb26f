//! # Runtime
//!
//! Everything generated dispatch code calls at request time, and the surface
//! a host uses to configure it:
//!
//! - [`CallContext`] - per-request handle (path, query, headers, body)
//! - [`ConverterRegistry`] / [`ProviderRegistry`] - `TypeId`-keyed lookups,
//!   filled through [`RoutingConfig`] before routes are registered
//! - [`RouteRegistrar`] - the seam a routing engine implements
//! - [`HandlerResponse`] / [`Reply`] - what a dispatch unit produces
//! - [`DispatchError`] - request-time failures and their status codes
//!
//! Missing converters and providers answer 400 like any other unusable
//! parameter; [`DispatchError::is_configuration_gap`] tells them apart so
//! engines can log them louder.

mod context;
mod dispatch;
mod error;
mod registry;
mod response;

pub use context::{CallContext, ParamVec, MAX_INLINE_PARAMS};
pub use dispatch::{
    convert_optional_param, convert_optional_param_with, convert_param, convert_param_with,
    dispatch_unit, provide, respond, respond_empty, respond_reply, DispatchFn, DispatchFuture,
    DispatchUnit, RouteRegistrar,
};
pub use error::{DispatchError, HttpError, ParamSource};
pub use http::{Method, StatusCode};
pub use registry::{
    converter_fn, provider_fn, Converter, ConverterRegistry, FnConverter, FnProvider,
    FromStrConverter, Provider, ProviderRegistry, Registries, RoutingConfig,
};
pub use response::{HandlerResponse, HeaderVec, Reply, MAX_INLINE_HEADERS};
