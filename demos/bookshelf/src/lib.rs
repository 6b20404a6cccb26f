//! Bookshelf: a small service whose routes are compiled by routecraft.
//!
//! Handlers live in [`routes`]; `build.rs` turns them into dispatch code that
//! is included below and registered against the reference router.

pub mod routes;
pub mod types;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/routes_gen.rs"));
}

pub use generated::register_routes;

use routecraft::prelude::*;
use routecraft::router::Router;
use types::{Answer, IsoDate, Store};

/// Converters and providers the routes need.
#[must_use]
pub fn routing_config(store: &Store) -> RoutingConfig {
    let mut config = RoutingConfig::new();
    config.register_converter(FromStrConverter::<IsoDate>::new());
    config.register_provider(provider_fn(|_ctx: &CallContext| async { Answer(42) }));
    let store = store.clone();
    config.register_provider(provider_fn(move |_ctx: &CallContext| {
        let store = store.clone();
        async move { store }
    }));
    config
}

/// A router with every compiled route registered.
#[must_use]
pub fn build_router(store: &Store) -> Router {
    let registries = routing_config(store).freeze();
    let mut router = Router::new();
    register_routes(&mut router, registries.converters, registries.providers);
    router
}
