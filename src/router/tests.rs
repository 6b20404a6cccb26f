use super::*;
use crate::runtime::{
    CallContext, DispatchError, DispatchFuture, DispatchUnit, HandlerResponse, HttpError, Method,
    ParamSource, RouteRegistrar, StatusCode,
};
use serde_json::json;
use std::sync::Arc;

fn echo_params() -> DispatchUnit {
    Arc::new(|ctx: CallContext| -> DispatchFuture {
        Box::pin(async move {
            let id = ctx.path_param("id").map(str::to_string);
            let page = ctx.path_param("page").map(str::to_string);
            Ok::<_, DispatchError>(HandlerResponse::json(
                StatusCode::OK,
                json!({ "id": id, "page": page }),
            ))
        })
    })
}

fn failing(err: fn() -> DispatchError) -> DispatchUnit {
    Arc::new(move |_ctx: CallContext| -> DispatchFuture { Box::pin(async move { Err::<HandlerResponse, _>(err()) }) })
}

#[test]
fn test_root_path() {
    let (re, params) = Router::path_to_regex("/").unwrap();
    assert!(re.is_match("/"));
    assert!(!re.is_match("/x"));
    assert!(params.is_empty());

    let (re, _) = Router::path_to_regex("").unwrap();
    assert!(re.is_match("/"));
}

#[test]
fn test_parameterized_path() {
    let (re, params) = Router::path_to_regex("/items/{id}").unwrap();
    assert!(re.is_match("/items/123"));
    assert!(re.is_match("/items/123/"));
    assert!(!re.is_match("/items"));
    assert!(!re.is_match("/items/1/2"));
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].as_ref(), "id");
}

#[test]
fn test_optional_placeholder() {
    let (re, params) = Router::path_to_regex("/pages/{page?}").unwrap();
    assert!(re.is_match("/pages"));
    assert!(re.is_match("/pages/2"));
    assert_eq!(params[0].as_ref(), "page");
}

#[test]
fn test_literal_segments_are_escaped() {
    let (re, _) = Router::path_to_regex("/v1.0/items").unwrap();
    assert!(re.is_match("/v1.0/items"));
    assert!(!re.is_match("/v1x0/items"));
}

#[test]
fn test_route_first_registration_wins() {
    let mut router = Router::new();
    router.register(Method::GET, "/items/{id}", echo_params());
    router.register(Method::GET, "/items/{page}", echo_params());
    router.register(Method::POST, "/items/{id}", echo_params());
    assert_eq!(router.len(), 3);

    let matched = router.route(&Method::GET, "/items/7").unwrap();
    assert_eq!(matched.template, "/items/{id}");
    assert_eq!(matched.get_path_param("id"), Some("7"));
    assert!(router.route(&Method::DELETE, "/items/7").is_none());
    assert!(router.route(&Method::GET, "/other").is_none());
}

#[tokio::test]
async fn test_dispatch_fills_path_params() {
    let mut router = Router::new();
    router.register(Method::GET, "/items/{id}/{page?}", echo_params());

    let response = router.dispatch(CallContext::new(Method::GET, "/items/5?x=1")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "id": "5", "page": null }));
    assert!(response.get_header(REQUEST_ID_RESPONSE_HEADER).is_some());

    let response = router.dispatch(CallContext::new(Method::GET, "/items/5/3")).await;
    assert_eq!(response.body, json!({ "id": "5", "page": "3" }));
}

#[tokio::test]
async fn test_path_params_are_percent_decoded() {
    let mut router = Router::new();
    router.register(Method::GET, "/shelves/{id}", echo_params());

    let response = router
        .dispatch(CallContext::new(Method::GET, "/shelves/sci%20fi%2Fbooks"))
        .await;
    assert_eq!(response.body, json!({ "id": "sci fi/books", "page": null }));

    let response = router.dispatch(CallContext::new(Method::GET, "/shelves/%FF")).await;
    assert_eq!(response.body, json!({ "id": "%FF", "page": null }));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let router = Router::new();
    let response = router.dispatch(CallContext::new(Method::GET, "/missing")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dispatch_errors_map_to_status() {
    let mut router = Router::new();
    router.register(
        Method::GET,
        "/bad",
        failing(|| DispatchError::MissingOrInvalidParameter {
            name: "id",
            location: ParamSource::Query,
        }),
    );
    router.register(
        Method::GET,
        "/gap",
        failing(|| DispatchError::MissingProvider {
            type_name: "bookshelf::User",
        }),
    );
    router.register(
        Method::GET,
        "/teapot",
        failing(|| DispatchError::handler(HttpError::new(StatusCode::IM_A_TEAPOT, "short and stout"))),
    );

    let bad = router.dispatch(CallContext::new(Method::GET, "/bad")).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let gap = router.dispatch(CallContext::new(Method::GET, "/gap")).await;
    assert_eq!(gap.status, StatusCode::BAD_REQUEST);
    assert!(gap.body_text().contains("bookshelf::User"));

    let teapot = router.dispatch(CallContext::new(Method::GET, "/teapot")).await;
    assert_eq!(teapot.status, StatusCode::IM_A_TEAPOT);
}

#[tokio::test]
async fn test_handle_reuses_request_id_header() {
    let mut router = Router::new();
    router.register(Method::GET, "/items/{id}", echo_params());
    let id = crate::ids::RequestId::new().to_string();
    let request = http::Request::builder()
        .method(Method::GET)
        .uri("/items/1")
        .header("x-request-id", id.as_str())
        .body(Vec::new())
        .unwrap();
    let response = router.handle(request).await;
    assert_eq!(response.get_header(REQUEST_ID_RESPONSE_HEADER), Some(id.as_str()));
}

#[test]
fn test_route_table() {
    let mut router = Router::new();
    router.register(Method::GET, "/a", echo_params());
    router.register(Method::PUT, "/b/{id}", echo_params());
    assert_eq!(
        router.route_table(),
        vec![
            (Method::GET, "/a".to_string()),
            (Method::PUT, "/b/{id}".to_string())
        ]
    );
}
