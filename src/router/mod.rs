//! # Router Module
//!
//! A reference routing engine for generated routes. It implements
//! [`RouteRegistrar`](crate::runtime::RouteRegistrar), so the generated
//! registration function can fill it directly, then matches requests by
//! method and path template and runs the matched dispatch unit.
//!
//! ## Matching
//!
//! Templates compile to anchored regexes at registration time:
//!
//! | Template segment | Matches |
//! |---|---|
//! | `items` | the literal segment |
//! | `{id}` | one non-empty segment, captured as `id` |
//! | `{id?}` | one segment or nothing |
//!
//! ## Example
//!
//! ```rust,ignore
//! use routecraft::router::Router;
//! use routecraft::runtime::{CallContext, Method, RoutingConfig};
//!
//! let registries = RoutingConfig::new().freeze();
//! let mut router = Router::new();
//! register_routes(&mut router, registries.converters, registries.providers);
//!
//! let response = router.dispatch(CallContext::new(Method::GET, "/items/1")).await;
//! ```
//!
//! Production hosts are free to put any engine behind the trait; this one
//! exists so generated code can be driven end to end in tests and demos.

mod core;
#[cfg(test)]
mod tests;

pub use core::{RouteMatch, Router, REQUEST_ID_RESPONSE_HEADER};
