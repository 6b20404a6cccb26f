use super::*;
use crate::model::{
    BindingKind, HandlerRef, HttpMethod, ParamMeta, PathTemplate, ReturnKind, ReturnShape,
    RouteMeta, TypeDesc, ValueSource,
};

fn route(method: HttpMethod, path: &str, handler: &str, params: Vec<ParamMeta>) -> RouteMeta {
    RouteMeta {
        method,
        path: PathTemplate::parse(path),
        handler: HandlerRef {
            ident: handler.rsplit("::").next().unwrap().to_string(),
            path: handler.to_string(),
            is_async: false,
        },
        params,
        returns: ReturnShape {
            kind: ReturnKind::Value,
            fallible: false,
        },
    }
}

fn query(name: &str, ty: &str, required: bool) -> ParamMeta {
    ParamMeta {
        name: name.to_string(),
        bound_name: name.to_string(),
        ty: TypeDesc::from_type(&syn::parse_str(ty).unwrap()),
        position: 0,
        kind: BindingKind::Query,
        required,
        source: ValueSource::ConverterRegistry,
    }
}

fn groups() -> Vec<RouteGroup> {
    vec![RouteGroup {
        name: "books".to_string(),
        module_path: "crate::routes::books".to_string(),
        prefix: "/books".to_string(),
        routes: vec![
            route(HttpMethod::Get, "/books", "crate::routes::books::list", vec![query("limit", "Option<u32>", false)]),
            route(HttpMethod::Get, "/books/all", "crate::routes::books::list", vec![]),
        ],
        groups: vec![RouteGroup {
            name: "reviews".to_string(),
            module_path: "crate::routes::books::reviews".to_string(),
            prefix: "/books/reviews".to_string(),
            routes: vec![route(
                HttpMethod::Delete,
                "/books/reviews",
                "crate::routes::books::reviews::purge",
                vec![],
            )],
            groups: vec![],
        }],
    }]
}

#[test]
fn test_generate_header_and_items() {
    let generated = generate(&groups(), &CompilerConfig::default()).unwrap();
    assert_eq!(generated.route_count(), 3);
    let source = &generated.source;
    assert!(source.starts_with("// @generated by routecraft-gen"));
    assert!(source.contains("//   GET /books -> crate::routes::books::list"));
    assert!(source.contains("//   DELETE /books/reviews -> crate::routes::books::reviews::purge"));
    assert!(source.contains("pub fn register_routes"));
    assert!(source.contains("fn register_books <"));
    assert!(source.contains("fn register_books_reviews <"));
    assert!(source.contains("register_books_reviews (router , converters , providers)"));
    assert!(source.contains("convert_optional_param (& converters , ctx . query_param (\"limit\"))"));
}

#[test]
fn test_duplicate_dispatch_names_get_suffix() {
    let generated = generate(&groups(), &CompilerConfig::default()).unwrap();
    assert!(generated.source.contains("fn dispatch_books_list ("));
    assert!(generated.source.contains("fn dispatch_books_list_1 ("));
}

#[test]
fn test_generate_is_deterministic() {
    let first = generate(&groups(), &CompilerConfig::default()).unwrap();
    let second = generate(&groups(), &CompilerConfig::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_runtime_path_and_entry_name() {
    let config = CompilerConfig {
        runtime_path: "crate::vendored::routecraft".to_string(),
        register_fn: "mount".to_string(),
        ..CompilerConfig::default()
    };
    let generated = generate(&groups(), &config).unwrap();
    assert!(generated.source.contains("pub fn mount <"));
    assert!(generated.source.contains("crate :: vendored :: routecraft :: runtime :: RouteRegistrar"));
}

#[test]
fn test_empty_model_still_renders_entry_point() {
    let generated = generate(&[], &CompilerConfig::default()).unwrap();
    assert_eq!(generated.route_count(), 0);
    assert!(generated.source.contains("pub fn register_routes"));
}

#[test]
fn test_write_routes_file_skips_identical_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("routes_gen.rs");
    assert!(write_routes_file(&path, "fn a() {}").unwrap());
    assert!(!write_routes_file(&path, "fn a() {}").unwrap());
    assert!(write_routes_file(&path, "fn b() {}").unwrap());
}
