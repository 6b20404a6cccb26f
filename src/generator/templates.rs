use askama::Template;
use std::fs;
use std::path::Path;

/// Route information for the header comment of a generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDisplay {
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Full path template
    pub path: String,
    /// Absolute handler path
    pub handler: String,
}

/// Frame of a generated routes file.
#[derive(Template)]
#[template(path = "routes.rs.txt", escape = "none")]
pub struct RoutesTemplateData {
    /// Name of the public registration function
    pub register_fn: String,
    /// Routes listed in the header
    pub routes: Vec<RouteDisplay>,
    /// Emitted items
    pub items: String,
}

pub fn render_routes(register_fn: &str, routes: Vec<RouteDisplay>, items: String) -> anyhow::Result<String> {
    let rendered = RoutesTemplateData {
        register_fn: register_fn.to_string(),
        routes,
        items,
    }
    .render()?;
    Ok(rendered)
}

/// Write `rendered` to `path`, creating parent directories.
///
/// Skips the write when the file already holds the same text so build
/// scripts do not trigger needless recompiles.
pub fn write_routes_file(path: &Path, rendered: &str) -> anyhow::Result<bool> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == rendered) {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, rendered)?;
    Ok(true)
}
