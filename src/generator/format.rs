use std::path::Path;
use std::process::Command;

/// Environment variable overriding the rustfmt binary.
pub const RUSTFMT_BIN_ENV: &str = "ROUTECRAFT_RUSTFMT_BIN";

/// Run rustfmt over a generated file in place.
pub fn format_file(path: &Path) -> anyhow::Result<()> {
    // Allow tests to override the rustfmt binary path without mutating PATH
    let rustfmt_bin = std::env::var(RUSTFMT_BIN_ENV).unwrap_or_else(|_| "rustfmt".to_string());

    let status = Command::new(&rustfmt_bin)
        .args(["--edition", "2021"])
        .arg(path)
        .status()
        .map_err(|err| anyhow::anyhow!("failed to run {rustfmt_bin}: {err}"))?;
    if !status.success() {
        anyhow::bail!("{rustfmt_bin} failed on {}", path.display());
    }
    Ok(())
}
