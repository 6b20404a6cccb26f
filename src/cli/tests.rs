//! Unit tests for CLI commands

use crate::cli::{inspect_json, inspect_table, resolve_config, Cli, Commands, LogFormat};
use crate::compiler::RouteCompiler;
use crate::config::CompilerConfig;
use clap::Parser;

const SOURCE: &str = r#"
    #[route_group("/items")]
    pub mod items {
        #[get("/{id}")]
        pub fn get_item(id: i32, #[query("q")] search: Option<String>) -> String {
            String::new()
        }
    }
"#;

#[test]
fn test_generate_command_with_flags() {
    let cli = Cli::try_parse_from([
        "routecraft-gen",
        "generate",
        "--input",
        "src/routes.rs",
        "--output",
        "out.rs",
        "--register-fn",
        "mount",
        "--fmt",
        "--verbose",
    ])
    .unwrap();

    assert!(cli.verbose);
    assert_eq!(cli.log_format, LogFormat::Text);
    match cli.command {
        Commands::Generate {
            source,
            output,
            register_fn,
            fmt,
            ..
        } => {
            assert_eq!(source.input.to_string_lossy(), "src/routes.rs");
            assert_eq!(output.unwrap().to_string_lossy(), "out.rs");
            assert_eq!(register_fn.as_deref(), Some("mount"));
            assert!(fmt);
        }
        other => panic!("Expected Generate command, got {other:?}"),
    }
}

#[test]
fn test_all_commands_parse() {
    let commands = vec![
        vec!["routecraft-gen", "generate", "--input", "routes.rs"],
        vec!["routecraft-gen", "check", "-i", "routes.rs"],
        vec!["routecraft-gen", "inspect", "--input", "routes.rs", "--json"],
        vec!["routecraft-gen", "--log-format", "json", "check", "--input", "routes.rs"],
    ];

    for args in commands {
        let cli = Cli::try_parse_from(&args);
        assert!(cli.is_ok(), "Failed to parse command: {:?}", args);
    }
    assert!(Cli::try_parse_from(["routecraft-gen", "check"]).is_err());
}

#[test]
fn test_flags_win_over_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("routecraft.toml");
    std::fs::write(&config_path, "module_path = \"crate::api\"\nregister_fn = \"from_file\"\n").unwrap();
    let config_arg = config_path.to_string_lossy().to_string();

    let cli = Cli::try_parse_from([
        "routecraft-gen",
        "--config",
        config_arg.as_str(),
        "generate",
        "--input",
        "routes.rs",
        "--register-fn",
        "from_flag",
    ])
    .unwrap();
    let config = resolve_config(&cli).unwrap();
    assert_eq!(config.module_path, "crate::api");
    assert_eq!(config.register_fn, "from_flag");

    let cli = Cli::try_parse_from([
        "routecraft-gen",
        "--config",
        config_arg.as_str(),
        "check",
        "--input",
        "routes.rs",
        "--module-path",
        "crate::web",
    ])
    .unwrap();
    assert_eq!(resolve_config(&cli).unwrap().module_path, "crate::web");
}

#[test]
fn test_inspect_output() {
    let mut compiler = RouteCompiler::new(CompilerConfig::default());
    compiler.add_source("routes.rs", SOURCE).unwrap();
    let groups = compiler.analyze().unwrap();

    let table = inspect_table(&groups);
    assert!(table.contains("GET     /items/{id} -> crate::routes::items::get_item"));
    assert!(table.contains("search: Option<String> [QUERY] (optional)"));

    let listing = inspect_json(&groups);
    let route = &listing["routes"][0];
    assert_eq!(route["method"], "GET");
    assert_eq!(route["params"][1]["bound_name"], "q");
    assert_eq!(route["params"][0]["required"], true);
}
