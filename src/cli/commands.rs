use crate::compiler::{compile_file, RouteCompiler};
use crate::config::CompilerConfig;
use crate::model::{BindingKind, RouteGroup, ValueSource};
use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;

/// Command-line interface for routecraft
///
/// Compiles annotated route groups into dispatch code, checks them, or
/// prints the routes they declare.
#[derive(Parser, Debug)]
#[command(name = "routecraft-gen")]
#[command(about = "routecraft route compiler", long_about = None, version)]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Configuration file (default: ./routecraft.toml when present)
    #[arg(long, global = true, env = "ROUTECRAFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Log line format for the subscriber installed by the binary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Settings shared by every subcommand; flags win over file and environment.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SourceArgs {
    /// Routes source file to scan
    #[arg(short, long)]
    pub input: PathBuf,

    /// Module path the source is mounted at in the host crate
    #[arg(long)]
    pub module_path: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a routes source into a routes file
    Generate {
        #[command(flatten)]
        source: SourceArgs,

        /// File to write (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path generated code uses to reach the runtime
        #[arg(long)]
        runtime_path: Option<String>,

        /// Name of the generated registration function
        #[arg(long)]
        register_fn: Option<String>,

        /// Run rustfmt over the written file
        #[arg(long, default_value_t = false)]
        fmt: bool,
    },
    /// Validate a routes source without writing anything
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print the routes a source declares
    Inspect {
        #[command(flatten)]
        source: SourceArgs,

        /// Print JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

impl Commands {
    fn source(&self) -> &SourceArgs {
        match self {
            Commands::Generate { source, .. }
            | Commands::Check { source }
            | Commands::Inspect { source, .. } => source,
        }
    }
}

/// Layer CLI flags over the loaded configuration.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<CompilerConfig> {
    let mut config = CompilerConfig::load(cli.config.as_deref())?;
    if let Some(module_path) = &cli.command.source().module_path {
        config.module_path = module_path.clone();
    }
    if let Commands::Generate {
        runtime_path,
        register_fn,
        fmt,
        ..
    } = &cli.command
    {
        if let Some(runtime_path) = runtime_path {
            config.runtime_path = runtime_path.clone();
        }
        if let Some(register_fn) = register_fn {
            config.register_fn = register_fn.clone();
        }
        config.format |= *fmt;
    }
    config.validate()?;
    Ok(config)
}

/// Execute the parsed command.
///
/// # Errors
///
/// Returns an error if the source cannot be read, declarations are invalid
/// (a [`Diagnostics`](crate::diagnostics::Diagnostics) inside the error), or
/// the output cannot be written.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    match &cli.command {
        Commands::Generate { source, output, .. } => match output {
            Some(output) => {
                let generated = compile_file(&source.input, output, &config)?;
                println!(
                    "✅ {} route(s) written to {}",
                    generated.route_count(),
                    output.display()
                );
                Ok(())
            }
            None => {
                let mut compiler = RouteCompiler::new(config);
                compiler.add_file(&source.input)?;
                print!("{}", compiler.generate()?.source);
                Ok(())
            }
        },
        Commands::Check { source } => {
            let groups = analyze(&source.input, config)?;
            let routes: usize = groups.iter().map(RouteGroup::route_count).sum();
            info!(input = %source.input.display(), routes, "Routes source is valid");
            println!("✅ {} group(s), {routes} route(s): no issues found", groups.len());
            Ok(())
        }
        Commands::Inspect { source, json } => {
            let groups = analyze(&source.input, config)?;
            if *json {
                let rendered = serde_json::to_string_pretty(&inspect_json(&groups))
                    .context("failed to render route listing")?;
                println!("{rendered}");
            } else {
                print!("{}", inspect_table(&groups));
            }
            Ok(())
        }
    }
}

fn analyze(input: &std::path::Path, config: CompilerConfig) -> anyhow::Result<Vec<RouteGroup>> {
    let mut compiler = RouteCompiler::new(config);
    compiler.add_file(input)?;
    Ok(compiler.analyze()?)
}

fn source_label(kind: BindingKind, source: &ValueSource) -> String {
    match source {
        ValueSource::ExplicitConverter { converter } => format!("{kind} via {converter}"),
        _ => kind.to_string(),
    }
}

/// One line per route, parameters indented under it.
#[must_use]
pub fn inspect_table(groups: &[RouteGroup]) -> String {
    let mut out = String::new();
    for group in groups {
        for route in group.all_routes() {
            out.push_str(&format!(
                "{:<7} {} -> {}\n",
                route.method.as_str(),
                route.path,
                route.handler.path
            ));
            for param in &route.params {
                let optional = if param.required { "" } else { " (optional)" };
                out.push_str(&format!(
                    "          {}: {} [{}]{optional}\n",
                    param.name,
                    param.ty,
                    source_label(param.kind, &param.source)
                ));
            }
        }
    }
    out
}

#[must_use]
pub fn inspect_json(groups: &[RouteGroup]) -> Value {
    let routes: Vec<Value> = groups
        .iter()
        .flat_map(RouteGroup::all_routes)
        .map(|route| {
            let params: Vec<Value> = route
                .params
                .iter()
                .map(|param| {
                    json!({
                        "name": param.name,
                        "bound_name": param.bound_name,
                        "type": param.ty.canonical(),
                        "kind": param.kind.to_string(),
                        "required": param.required,
                        "converter": match &param.source {
                            ValueSource::ExplicitConverter { converter } => Some(converter.as_str()),
                            _ => None,
                        },
                    })
                })
                .collect();
            json!({
                "method": route.method.as_str(),
                "path": route.path.as_str(),
                "handler": route.handler.path,
                "async": route.handler.is_async,
                "params": params,
            })
        })
        .collect();
    json!({ "routes": routes })
}
