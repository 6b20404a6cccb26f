//! Declaration graph: a side table of every marked item in the scanned sources.
//!
//! Sources are parsed with `syn`; nothing here evaluates Rust. Each file is
//! mounted at the module path it occupies in the host crate so handler and
//! converter paths can be made absolute for the generated code.

mod load;
mod types;

pub use load::load_source;
pub use types::*;

use crate::diagnostics::Diagnostics;
use anyhow::Context;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct DeclarationGraph {
    units: Vec<SourceUnit>,
    converters: Vec<ConverterImpl>,
}

impl DeclarationGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a single source string.
    pub fn from_source(module_path: &str, file: &str, source: &str) -> Result<Self, Diagnostics> {
        let mut graph = Self::new();
        graph.add_source(module_path, file, source)?;
        Ok(graph)
    }

    pub fn add_source(&mut self, module_path: &str, file: &str, source: &str) -> Result<(), Diagnostics> {
        let (unit, converters) = load_source(module_path, file, source)?;
        self.units.push(unit);
        self.converters.extend(converters);
        Ok(())
    }

    /// Read and add a file. I/O failures are reported through `anyhow`,
    /// declaration problems as [`Diagnostics`] wrapped in it.
    pub fn add_file(&mut self, module_path: &str, path: &Path) -> anyhow::Result<()> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read routes source {}", path.display()))?;
        self.add_source(module_path, &path.display().to_string(), &source)?;
        Ok(())
    }

    #[must_use]
    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    #[must_use]
    pub fn converters(&self) -> &[ConverterImpl] {
        &self.converters
    }
}
