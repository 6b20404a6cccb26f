use anyhow::Context;
use routecraft::generator::write_routes_file;
use routecraft::{CompilerConfig, RouteCompiler};
use std::env;
use std::path::{Path, PathBuf};

fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed=src/routes.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let config = CompilerConfig {
        module_path: "crate::routes".to_string(),
        ..CompilerConfig::default()
    };
    let mut compiler = RouteCompiler::new(config);
    compiler
        .add_file(Path::new("src/routes.rs"))?
        .add_module_file("crate::types", Path::new("src/types.rs"))?;
    let generated = compiler.generate()?;

    let out = PathBuf::from(env::var("OUT_DIR").context("OUT_DIR is not set")?).join("routes_gen.rs");
    write_routes_file(&out, &generated.source)?;
    Ok(())
}
