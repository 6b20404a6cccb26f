//! # Compiler Configuration
//!
//! Settings that shape the generated file. Values are layered, later layers
//! winning:
//!
//! 1. built-in defaults
//! 2. `routecraft.toml` (an explicit path, or the file in the working directory if present)
//! 3. `ROUTECRAFT_*` environment variables
//! 4. CLI flags (applied by [`crate::cli`])
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `ROUTECRAFT_MODULE_PATH` | `module_path` | `crate::routes` |
//! | `ROUTECRAFT_RUNTIME_PATH` | `runtime_path` | `::routecraft` |
//! | `ROUTECRAFT_REGISTER_FN` | `register_fn` | `register_routes` |
//! | `ROUTECRAFT_FORMAT` | `format` | `false` |
//!
//! ## Example
//!
//! ```toml
//! module_path = "crate::api::routes"
//! register_fn = "register_api"
//! format = true
//! ```

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Name of the optional configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "routecraft.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Module path the scanned file is mounted at in the host crate.
    pub module_path: String,
    /// Path generated code uses to reach this crate's runtime.
    pub runtime_path: String,
    /// Name of the generated top-level registration function.
    pub register_fn: String,
    /// Run rustfmt over the written file.
    pub format: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            module_path: "crate::routes".to_string(),
            runtime_path: "::routecraft".to_string(),
            register_fn: "register_routes".to_string(),
            format: false,
        }
    }
}

impl CompilerConfig {
    /// Defaults with `ROUTECRAFT_*` overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid routecraft configuration")
    }

    /// Defaults, then the config file, then the environment.
    ///
    /// With `path == None` the working-directory `routecraft.toml` is used
    /// when it exists; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let base = match path {
            Some(path) => Self::read_file(path)?,
            None if Path::new(CONFIG_FILE).is_file() => Self::read_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };
        let config = base.with_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Apply environment-style overrides from `lookup`.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("ROUTECRAFT_MODULE_PATH") {
            self.module_path = value;
        }
        if let Some(value) = lookup("ROUTECRAFT_RUNTIME_PATH") {
            self.runtime_path = value;
        }
        if let Some(value) = lookup("ROUTECRAFT_REGISTER_FN") {
            self.register_fn = value;
        }
        if let Some(value) = lookup("ROUTECRAFT_FORMAT") {
            self.format = matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        self
    }

    /// Every path setting must parse as a Rust path, the function name as an identifier.
    pub fn validate(&self) -> anyhow::Result<()> {
        if syn::parse_str::<syn::Path>(&self.module_path).is_err() {
            bail!("module_path `{}` is not a Rust path", self.module_path);
        }
        if syn::parse_str::<syn::Path>(&self.runtime_path).is_err() {
            bail!("runtime_path `{}` is not a Rust path", self.runtime_path);
        }
        if syn::parse_str::<syn::Ident>(&self.register_fn).is_err() {
            bail!("register_fn `{}` is not a Rust identifier", self.register_fn);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.module_path, "crate::routes");
        assert_eq!(config.runtime_path, "::routecraft");
        assert_eq!(config.register_fn, "register_routes");
        assert!(!config.format);
        config.validate().unwrap();
    }

    #[test]
    fn test_toml_then_overrides() {
        let config = CompilerConfig::from_toml_str("module_path = \"crate::api\"\nformat = true\n").unwrap();
        assert_eq!(config.module_path, "crate::api");
        assert!(config.format);
        assert_eq!(config.register_fn, "register_routes");

        let env: HashMap<&str, &str> = [("ROUTECRAFT_REGISTER_FN", "mount"), ("ROUTECRAFT_FORMAT", "0")]
            .into_iter()
            .collect();
        let config = config.with_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.register_fn, "mount");
        assert!(!config.format);
        assert_eq!(config.module_path, "crate::api");
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(CompilerConfig::from_toml_str("modul_path = \"crate\"").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_paths() {
        let config = CompilerConfig {
            module_path: "crate::".to_string(),
            ..CompilerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = CompilerConfig {
            register_fn: "register routes".to_string(),
            ..CompilerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routecraft.toml");
        std::fs::write(&path, "runtime_path = \"routecraft\"\n").unwrap();
        let config = CompilerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.runtime_path, "routecraft");
        assert!(CompilerConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
