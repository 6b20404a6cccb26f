//! # Compiler Driver
//!
//! Runs the whole pipeline over one or more routes sources:
//!
//! 1. parse each source into the [`DeclarationGraph`]
//! 2. [`scan`] for route groups and handlers
//! 3. per handler: check the method, classify the return type,
//!    [`bind_params`], then [`resolve_params`]
//! 4. [`generator::generate`] the routes file
//!
//! Every route is processed even after an earlier one failed, so a single
//! run reports every problem. Any diagnostic fails the compilation.

use crate::binder::{bind_params, RouteContext};
use crate::config::CompilerConfig;
use crate::declaration::DeclarationGraph;
use crate::diagnostics::{CompileError, Diagnostics};
use crate::generator::{self, emit::classify_return};
use crate::model::{HandlerRef, HttpMethod, PathTemplate, RouteGroup, RouteMeta};
use crate::resolver::resolve_params;
use crate::scanner::{scan, GroupDecl, HandlerDecl};
use anyhow::Context;
use std::path::Path;
use tracing::{debug, info};

pub use crate::generator::GeneratedRouter;

/// Accumulates routes sources and compiles them into one routes file.
#[derive(Debug, Clone)]
pub struct RouteCompiler {
    config: CompilerConfig,
    graph: DeclarationGraph,
}

impl RouteCompiler {
    #[must_use]
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            graph: DeclarationGraph::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    #[must_use]
    pub fn graph(&self) -> &DeclarationGraph {
        &self.graph
    }

    /// Add source text mounted at the configured module path.
    pub fn add_source(&mut self, file: &str, source: &str) -> Result<&mut Self, Diagnostics> {
        let module_path = self.config.module_path.clone();
        self.add_module_source(&module_path, file, source)
    }

    /// Add source text mounted at `module_path`.
    pub fn add_module_source(
        &mut self,
        module_path: &str,
        file: &str,
        source: &str,
    ) -> Result<&mut Self, Diagnostics> {
        self.graph.add_source(module_path, file, source)?;
        Ok(self)
    }

    /// Read a file mounted at the configured module path.
    pub fn add_file(&mut self, path: &Path) -> anyhow::Result<&mut Self> {
        let module_path = self.config.module_path.clone();
        self.add_module_file(&module_path, path)
    }

    pub fn add_module_file(&mut self, module_path: &str, path: &Path) -> anyhow::Result<&mut Self> {
        self.graph.add_file(module_path, path)?;
        Ok(self)
    }

    /// Validate every declaration and build the route model.
    pub fn analyze(&self) -> Result<Vec<RouteGroup>, Diagnostics> {
        let (decls, mut diagnostics) = scan(&self.graph);
        let groups: Vec<RouteGroup> = decls
            .iter()
            .map(|decl| self.build_group(decl, &mut diagnostics))
            .collect();
        let routes: usize = groups.iter().map(RouteGroup::route_count).sum();
        debug!(
            groups = groups.len(),
            routes,
            errors = diagnostics.len(),
            "Analyzed route declarations"
        );
        diagnostics.into_result(groups)
    }

    /// Analyze, then render the routes file.
    pub fn generate(&self) -> anyhow::Result<GeneratedRouter> {
        let groups = self.analyze()?;
        generator::generate(&groups, &self.config)
    }

    fn build_group(&self, decl: &GroupDecl<'_>, diagnostics: &mut Diagnostics) -> RouteGroup {
        let mut routes = Vec::with_capacity(decl.handlers.len());
        for handler in &decl.handlers {
            match self.build_route(decl, handler) {
                Ok(route) => routes.push(route),
                Err(error) => diagnostics.push(error),
            }
        }
        RouteGroup {
            name: decl.name.clone(),
            module_path: decl.module_path.clone(),
            prefix: decl.prefix.clone(),
            routes,
            groups: decl
                .groups
                .iter()
                .map(|nested| self.build_group(nested, diagnostics))
                .collect(),
        }
    }

    fn build_route(&self, group: &GroupDecl<'_>, handler: &HandlerDecl<'_>) -> Result<RouteMeta, CompileError> {
        let ctx = RouteContext {
            route: &handler.full_path,
            handler: &handler.ident,
            location: &handler.location,
        };
        let method = HttpMethod::parse(&handler.method).ok_or_else(|| {
            CompileError::UnsupportedHttpMethod {
                location: handler.location.clone(),
                route: handler.full_path.clone(),
                method: handler.method.clone(),
            }
        })?;
        let returns = classify_return(&handler.signature.output).map_err(|found| {
            CompileError::MissingReturnType {
                location: handler.location.clone(),
                route: handler.full_path.clone(),
                handler: handler.ident.clone(),
                found,
            }
        })?;
        let bound = bind_params(ctx, handler.signature)?;
        let params = resolve_params(ctx, &group.module_path, bound, self.graph.converters())?;

        debug!(
            method = %method,
            path = %handler.full_path,
            handler = %handler.handler_path,
            params = params.len(),
            "Resolved route"
        );
        Ok(RouteMeta {
            method,
            path: PathTemplate::parse(&handler.full_path),
            handler: HandlerRef {
                ident: handler.ident.clone(),
                path: handler.handler_path.clone(),
                is_async: handler.signature.is_async,
            },
            params,
            returns,
        })
    }
}

/// Compile routes source text into the contents of a routes file.
///
/// Declaration problems surface as a [`Diagnostics`] inside the error and can
/// be recovered with `downcast_ref`.
pub fn compile_source(source: &str, config: &CompilerConfig) -> anyhow::Result<GeneratedRouter> {
    let mut compiler = RouteCompiler::new(config.clone());
    compiler.add_source("<routes>", source)?;
    compiler.generate()
}

/// Compile `input` and write the routes file to `output`.
///
/// The file is left untouched when its contents would not change; rustfmt
/// runs only after an actual write.
pub fn compile_file(input: &Path, output: &Path, config: &CompilerConfig) -> anyhow::Result<GeneratedRouter> {
    let mut compiler = RouteCompiler::new(config.clone());
    compiler.add_file(input)?;
    let generated = compiler.generate()?;

    let written = generator::write_routes_file(output, &generated.source)
        .with_context(|| format!("failed to write {}", output.display()))?;
    if written && config.format {
        generator::format_file(output)?;
    }
    info!(
        input = %input.display(),
        output = %output.display(),
        routes = generated.route_count(),
        written,
        "Compiled routes"
    );
    Ok(generated)
}
