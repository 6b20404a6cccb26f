//! # Generator Module
//!
//! Turns the resolved route model into Rust source that a host crate
//! `include!`s.
//!
//! ## Generated Structure
//!
//! ```text
//! // header comment listing every route
//! pub fn register_routes<R: RouteRegistrar + ?Sized>(router, converters, providers)
//! fn register_<group>(..)          // one per group, nested groups chained
//! fn dispatch_<group>_<handler>(..) // one per route
//! ```
//!
//! The frame is an askama template (`templates/routes.rs.txt`); items are
//! built with `quote` and re-parsed with `syn` before anything is written,
//! so a malformed emission fails here rather than in the host's build.
//! Output is deterministic: compiling the same declarations twice yields
//! byte-identical files.

mod assembly;
pub mod emit;
mod format;
mod templates;

pub use assembly::{assemble, Assembly};
pub use format::{format_file, RUSTFMT_BIN_ENV};
pub use templates::{render_routes, write_routes_file, RouteDisplay, RoutesTemplateData};

use crate::config::CompilerConfig;
use crate::model::RouteGroup;
use anyhow::Context;

/// A rendered routes file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedRouter {
    pub source: String,
    pub routes: Vec<RouteDisplay>,
}

impl GeneratedRouter {
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}

/// Render the routes file for `groups`.
pub fn generate(groups: &[RouteGroup], config: &CompilerConfig) -> anyhow::Result<GeneratedRouter> {
    config.validate()?;
    let Assembly { items, routes } = assemble(groups, &config.runtime_path, &config.register_fn);
    syn::parse2::<syn::File>(items.clone()).context("emitted dispatch code does not parse")?;
    let source = render_routes(&config.register_fn, routes.clone(), items.to_string())?;
    Ok(GeneratedRouter { source, routes })
}

#[cfg(test)]
mod tests;
