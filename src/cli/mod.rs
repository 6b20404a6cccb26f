//! # CLI Module
//!
//! Command-line front end of the route compiler, shipped as the
//! `routecraft-gen` binary.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Compile a routes source into a routes file:
//!
//! ```bash
//! routecraft-gen generate --input src/routes.rs --output src/routes_gen.rs
//! ```
//!
//! Options:
//! - `--input <FILE>` - routes source to scan (required)
//! - `--output <FILE>` - file to write; stdout when omitted
//! - `--module-path <PATH>` - where the source is mounted in the host crate
//! - `--runtime-path <PATH>` - how generated code reaches the runtime
//! - `--register-fn <NAME>` - name of the generated entry point
//! - `--fmt` - run rustfmt over the written file
//!
//! ### `check`
//!
//! Validate declarations and report every problem without writing:
//!
//! ```bash
//! routecraft-gen check --input src/routes.rs
//! ```
//!
//! ### `inspect`
//!
//! List routes with their parameter bindings, as a table or `--json`:
//!
//! ```bash
//! routecraft-gen inspect --input src/routes.rs --json
//! ```
//!
//! ## Global flags
//!
//! `--verbose` logs at debug level, `--log-format json` switches to JSON
//! lines, `--config <FILE>` picks a `routecraft.toml`. Flags win over the
//! file and `ROUTECRAFT_*` variables.

mod commands;
mod logging;

#[cfg(test)]
mod tests;

pub use commands::{inspect_json, inspect_table, resolve_config, run_cli, Cli, Commands, LogFormat, SourceArgs};
pub use logging::{default_directive, init_logging};
