//! Route group discovery.
//!
//! Walks the top-level declarations of every source unit. Each item carrying
//! `#[route_group]` becomes a group; inside it, functions carrying a method
//! marker become handlers and modules carrying `#[route_group]` become nested
//! groups whose prefix is the parent's prefix followed by their own. Prefixes
//! are concatenated verbatim.

use crate::declaration::{
    DeclKind, Declaration, DeclarationGraph, FnSignature, Location, Visibility,
};
use crate::diagnostics::{CompileError, Diagnostics};
use std::collections::HashSet;
use tracing::{debug, warn};

/// A discovered route group, before parameter binding.
#[derive(Debug, Clone)]
pub struct GroupDecl<'g> {
    pub name: String,
    pub module_path: String,
    pub prefix: String,
    pub handlers: Vec<HandlerDecl<'g>>,
    pub groups: Vec<GroupDecl<'g>>,
    pub location: Location,
}

/// A discovered handler function.
#[derive(Debug, Clone)]
pub struct HandlerDecl<'g> {
    pub ident: String,
    /// Absolute path of the function in the host crate.
    pub handler_path: String,
    /// Method as written in the marker, validated later.
    pub method: String,
    /// Group prefix followed by the handler's own path.
    pub full_path: String,
    pub signature: &'g FnSignature,
    pub location: Location,
}

/// Discover every group reachable from top-level declarations.
///
/// Problems are collected rather than aborting, so the groups that did scan
/// cleanly are still returned alongside the diagnostics.
#[must_use]
pub fn scan(graph: &DeclarationGraph) -> (Vec<GroupDecl<'_>>, Diagnostics) {
    let mut scanner = Scanner {
        diagnostics: Diagnostics::new(),
        seen: HashSet::new(),
    };
    let mut groups = Vec::new();
    for unit in graph.units() {
        for item in &unit.items {
            if item.is_group() {
                if let Some(group) = scanner.scan_group(item, &unit.module_path, "") {
                    groups.push(group);
                }
            } else {
                scanner.check_stray(item, &unit.module_path);
            }
        }
    }
    debug!(groups = groups.len(), errors = scanner.diagnostics.len(), "Scanned route groups");
    (groups, scanner.diagnostics)
}

struct Scanner {
    diagnostics: Diagnostics,
    /// Module paths of groups already registered.
    seen: HashSet<String>,
}

impl Scanner {
    fn invalid(&mut self, decl: &Declaration, reason: impl Into<String>) {
        self.diagnostics.push(CompileError::InvalidDeclaration {
            location: decl.location.clone(),
            name: decl.ident.clone(),
            reason: reason.into(),
        });
    }

    fn inaccessible(&mut self, decl: &Declaration, reason: impl Into<String>) {
        self.diagnostics.push(CompileError::InaccessibleDeclaration {
            location: decl.location.clone(),
            name: decl.ident.clone(),
            reason: reason.into(),
        });
    }

    fn scan_group<'g>(
        &mut self,
        decl: &'g Declaration,
        parent_module: &str,
        parent_prefix: &str,
    ) -> Option<GroupDecl<'g>> {
        if decl.kind != DeclKind::Module {
            self.invalid(
                decl,
                format!(
                    "#[route_group] must decorate a module, found a {}; a route group is a singleton",
                    decl.kind
                ),
            );
            return None;
        }
        if !decl.inline {
            self.invalid(decl, "#[route_group] requires an inline module body");
            return None;
        }
        let module_path = format!("{parent_module}::{}", decl.ident);
        if !self.seen.insert(module_path.clone()) {
            self.invalid(decl, format!("route group `{module_path}` is declared more than once"));
            return None;
        }
        if decl.visibility == Visibility::Inherited {
            self.inaccessible(decl, "route group modules must be `pub` or `pub(crate)`");
        }

        let own_prefix = decl.group_prefix().unwrap_or_default();
        if has_control_chars(own_prefix) {
            self.invalid(decl, format!("route group prefix {own_prefix:?} contains control characters"));
            return None;
        }
        let prefix = format!("{parent_prefix}{own_prefix}");
        let mut group = GroupDecl {
            name: decl.ident.clone(),
            module_path: module_path.clone(),
            prefix: prefix.clone(),
            handlers: Vec::new(),
            groups: Vec::new(),
            location: decl.location.clone(),
        };

        for child in &decl.children {
            if child.is_group() {
                if let Some(nested) = self.scan_group(child, &module_path, &prefix) {
                    group.groups.push(nested);
                }
                continue;
            }
            let methods: Vec<(&str, &str)> = child.method_markers().collect();
            if methods.is_empty() {
                self.check_stray(child, &module_path);
                continue;
            }
            let Some(signature) = child.signature.as_ref().filter(|_| child.kind == DeclKind::Function) else {
                self.invalid(child, format!("method markers apply to functions, found a {}", child.kind));
                continue;
            };
            if methods.len() > 1 {
                self.invalid(child, "a handler may carry only one method marker");
                continue;
            }
            if child.visibility == Visibility::Inherited {
                self.inaccessible(child, "handlers must be `pub` or `pub(crate)`");
            }
            let (method, path) = methods[0];
            if has_control_chars(path) {
                self.invalid(child, format!("route path {path:?} contains control characters"));
                continue;
            }
            let handler = HandlerDecl {
                ident: child.ident.clone(),
                handler_path: format!("{module_path}::{}", child.ident),
                method: method.to_string(),
                full_path: format!("{prefix}{path}"),
                signature,
                location: child.location.clone(),
            };
            debug!(
                group = %group.name,
                handler = %handler.ident,
                method = %handler.method,
                path = %handler.full_path,
                "Discovered handler"
            );
            group.handlers.push(handler);
        }
        Some(group)
    }

    /// Markers outside any group are not discovered; say so.
    fn check_stray(&mut self, decl: &Declaration, module_path: &str) {
        if decl.method_markers().next().is_some() {
            warn!(
                handler = %decl.ident,
                module_path = %module_path,
                location = %decl.location,
                "Method marker outside a route group is ignored"
            );
        }
        if decl.kind != DeclKind::Module {
            return;
        }
        let nested_path = format!("{module_path}::{}", decl.ident);
        for child in &decl.children {
            if child.is_group() {
                warn!(
                    group = %child.ident,
                    module_path = %nested_path,
                    location = %child.location,
                    "Route group nested in an unmarked module is not discovered; move it to the top level"
                );
            } else {
                self.check_stray(child, &nested_path);
            }
        }
    }
}

fn has_control_chars(text: &str) -> bool {
    text.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorKind;

    fn graph(source: &str) -> DeclarationGraph {
        DeclarationGraph::from_source("crate::routes", "routes.rs", source).unwrap()
    }

    #[test]
    fn test_nested_groups_concatenate_prefixes() {
        let graph = graph(
            r#"
            #[route_group("/api/")]
            pub mod api {
                #[get("/ping")]
                pub fn ping() -> &'static str { "pong" }

                #[route_group("/v1")]
                pub mod v1 {
                    #[post("/items")]
                    pub fn create() {}
                }

                #[get("/health")]
                pub fn health() {}
            }
            "#,
        );
        let (groups, diagnostics) = scan(&graph);
        assert!(diagnostics.is_empty(), "{diagnostics}");
        assert_eq!(groups.len(), 1);
        let api = &groups[0];
        assert_eq!(api.module_path, "crate::routes::api");
        let paths: Vec<_> = api.handlers.iter().map(|h| h.full_path.as_str()).collect();
        assert_eq!(paths, vec!["/api//ping", "/api//health"]);
        assert_eq!(api.groups[0].prefix, "/api//v1");
        assert_eq!(api.groups[0].handlers[0].full_path, "/api//v1/items");
        assert_eq!(
            api.groups[0].handlers[0].handler_path,
            "crate::routes::api::v1::create"
        );
    }

    #[test]
    fn test_group_marker_on_struct_is_invalid() {
        let graph = graph(
            r#"
            #[route_group("/x")]
            pub struct NotAModule;
            "#,
        );
        let (groups, diagnostics) = scan(&graph);
        assert!(groups.is_empty());
        assert_eq!(diagnostics.kinds(), vec![ErrorKind::InvalidDeclaration]);
    }

    #[test]
    fn test_duplicate_group_identity() {
        let mut graph = graph("#[route_group] pub mod a { #[get] pub fn x() {} }");
        graph
            .add_source("crate::routes", "other.rs", "#[route_group] pub mod a {}")
            .unwrap();
        let (groups, diagnostics) = scan(&graph);
        assert_eq!(groups.len(), 1);
        assert_eq!(diagnostics.kinds(), vec![ErrorKind::InvalidDeclaration]);
    }

    #[test]
    fn test_private_handler_is_inaccessible() {
        let graph = graph(
            r#"
            #[route_group("/x")]
            pub mod x {
                #[get("/y")]
                fn hidden() {}
            }
            "#,
        );
        let (_, diagnostics) = scan(&graph);
        assert_eq!(diagnostics.kinds(), vec![ErrorKind::InaccessibleDeclaration]);
    }

    #[test]
    fn test_group_nested_in_unmarked_module_is_skipped() {
        let graph = graph(
            r#"
            pub mod plain {
                #[route_group("/x")]
                pub mod x {
                    #[get("/y")]
                    pub fn y() {}
                }
            }
            "#,
        );
        let (groups, diagnostics) = scan(&graph);
        assert!(groups.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_two_method_markers_rejected() {
        let graph = graph(
            r#"
            #[route_group]
            pub mod x {
                #[get("/a")]
                #[post("/a")]
                pub fn both() {}
            }
            "#,
        );
        let (groups, diagnostics) = scan(&graph);
        assert!(groups[0].handlers.is_empty());
        assert_eq!(diagnostics.kinds(), vec![ErrorKind::InvalidDeclaration]);
    }

    #[test]
    fn test_control_characters_in_paths_rejected() {
        let graph = graph(
            r#"
            #[route_group("/ok")]
            pub mod ok {
                #[get("/a\nfn injected() {}")]
                pub fn broken() {}

                #[get("/fine")]
                pub fn fine() {}
            }

            #[route_group("/bad\u{7}")]
            pub mod bad {
                #[get]
                pub fn x() {}
            }
            "#,
        );
        let (groups, diagnostics) = scan(&graph);
        assert_eq!(
            diagnostics.kinds(),
            vec![ErrorKind::InvalidDeclaration, ErrorKind::InvalidDeclaration]
        );
        assert_eq!(groups.len(), 1);
        let paths: Vec<_> = groups[0].handlers.iter().map(|h| h.full_path.as_str()).collect();
        assert_eq!(paths, vec!["/ok/fine"]);
        assert!(diagnostics.to_string().contains("control characters"));
    }
}
