//! # routecraft
//!
//! **routecraft** is a build-time route compiler. Route groups and handlers are
//! declared as ordinary Rust items decorated with marker attributes; the
//! compiler scans that source, validates every handler parameter, resolves the
//! converters and providers each one needs, and emits plain Rust dispatch code
//! that the host crate `include!`s. Nothing is reflected at request time: every
//! route is a directly callable function registered against a routing engine.
//!
//! ## Architecture
//!
//! - **[`declaration`]** - parses source text into a declaration graph (side table of markers)
//! - **[`scanner`]** - discovers route groups, nested groups and their handlers
//! - **[`binder`]** - classifies and validates handler parameters
//! - **[`resolver`]** - attaches explicit converters or deferred registry lookups
//! - **[`generator`]** - emits per-route dispatch functions and the router assembly
//! - **[`compiler`]** - drives the pipeline and collects [`diagnostics`]
//! - **[`runtime`]** - request context, registries and helpers used by generated code
//! - **[`router`]** - reference in-process routing engine for hosting and tests
//! - **[`cli`]** - the `routecraft-gen` command line
//!
//! ### Compilation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Build as build.rs / routecraft-gen
//!     participant Decl as declaration::load
//!     participant Scan as scanner::scan
//!     participant Bind as binder::bind_params
//!     participant Res as resolver::resolve_params
//!     participant Emit as generator::emit
//!     participant Asm as generator::assembly
//!
//!     Build->>Decl: parse routes.rs
//!     Decl-->>Scan: DeclarationGraph
//!     Scan-->>Bind: GroupDecl tree
//!     Bind-->>Res: Vec<BoundParam>
//!     Res-->>Emit: RouteGroup model
//!     Emit-->>Asm: dispatch functions
//!     Asm-->>Build: routes_gen.rs
//! ```
//!
//! ## Declaring routes
//!
//! ```rust,ignore
//! use routecraft::prelude::*;
//!
//! #[route_group("/items")]
//! pub mod items {
//!     use routecraft::prelude::*;
//!
//!     #[get("/{id}")]
//!     pub fn get_item(id: i32, #[query] verbose: Option<bool>) -> String {
//!         format!("item {id} verbose={verbose:?}")
//!     }
//! }
//! ```
//!
//! ## Compiling from a build script
//!
//! ```rust,ignore
//! let out = std::path::PathBuf::from(std::env::var("OUT_DIR")?).join("routes_gen.rs");
//! routecraft::compile_file("src/routes.rs".as_ref(), &out, &routecraft::CompilerConfig::default())?;
//! ```
//!
//! ## Serving
//!
//! ```rust,ignore
//! include!(concat!(env!("OUT_DIR"), "/routes_gen.rs"));
//!
//! let mut config = routecraft::runtime::RoutingConfig::new();
//! config.register_provider(provider_fn(|_ctx: &CallContext| async { Session::anonymous() }));
//! let registries = config.freeze();
//! let mut router = routecraft::router::Router::new();
//! register_routes(&mut router, registries.converters, registries.providers);
//! ```

pub mod binder;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod declaration;
pub mod diagnostics;
pub mod generator;
pub mod ids;
pub mod model;
pub mod resolver;
pub mod router;
pub mod runtime;
pub mod scanner;

pub use compiler::{compile_file, compile_source, GeneratedRouter, RouteCompiler};
pub use config::CompilerConfig;
pub use diagnostics::{CompileError, Diagnostics, ErrorKind};
pub use routecraft_macros::{delete, get, head, options, patch, post, put, route, route_group};

/// Everything a routes file and its host usually need in scope.
pub mod prelude {
    pub use crate::runtime::{
        converter_fn, provider_fn, CallContext, Converter, FromStrConverter, HttpError,
        Provider, Reply, RoutingConfig, StatusCode,
    };
    pub use routecraft_macros::{delete, get, head, options, patch, post, put, route, route_group};
}
