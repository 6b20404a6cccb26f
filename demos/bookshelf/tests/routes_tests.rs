use bookshelf::build_router;
use bookshelf::types::{IsoDate, IsoDateConverter, Store};
use http::{Method, StatusCode};
use routecraft::prelude::*;
use routecraft::router::Router;
use routecraft::runtime::HandlerResponse;

fn router() -> Router {
    build_router(&Store::new())
}

async fn get(router: &Router, uri: &str) -> HandlerResponse {
    router.dispatch(CallContext::new(Method::GET, uri)).await
}

async fn get_with_header(router: &Router, uri: &str, name: &str, value: &str) -> HandlerResponse {
    router
        .dispatch(CallContext::new(Method::GET, uri).with_header(name, value))
        .await
}

fn assert_ok(response: &HandlerResponse, body: &str) {
    assert_eq!(response.status, StatusCode::OK, "{}", response.body_text());
    assert_eq!(response.body_text(), body);
}

#[tokio::test]
async fn test_route_without_params() {
    let router = router();
    assert_ok(&get(&router, "/test/without-params").await, "nice");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let router = router();
    let response = get(&router, "/test/unknown").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.get_header("x-request-id").is_some());
}

#[tokio::test]
async fn test_handler_http_error_keeps_status() {
    let router = router();
    let response = get(&router, "/test/failing").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body_text().contains("no such thing"));

    let response = get(&router, "/test/failing-anyhow").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body_text().contains("nothing here"));
}

#[tokio::test]
async fn test_int_path_param() {
    let router = router();
    assert_ok(&get(&router, "/test/int-path/1").await, "nice 1");
    assert_eq!(
        get(&router, "/test/int-path/abc").await.status,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_registered_converter() {
    let router = router();
    assert_ok(&get(&router, "/test/registered-converter/2021-01-01").await, "nice 1");
    assert_ok(&get(&router, "/test/registered-converter/2020-03-01").await, "nice 61");
    assert_eq!(
        get(&router, "/test/registered-converter/2021-01-01-01").await.status,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_unregistered_converter_is_a_bad_request() {
    let router = router();
    let response = get(&router, "/test/unregistered-converter/abc").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body_text().contains("Tag"), "{}", response.body_text());
}

#[tokio::test]
async fn test_annotated_converter() {
    let router = router();
    assert_ok(&get(&router, "/test/annotated-converter/abc").await, "nice abc");
}

#[tokio::test]
async fn test_query_params() {
    let router = router();
    assert_ok(&get(&router, "/test/int-query?id=7").await, "nice 7");
    assert_eq!(get(&router, "/test/int-query").await.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        get(&router, "/test/int-query?id=seven").await.status,
        StatusCode::BAD_REQUEST
    );

    assert_ok(&get(&router, "/test/optional-query").await, "nice null");
    assert_ok(&get(&router, "/test/optional-query?id=1").await, "nice 1");

    assert_ok(&get(&router, "/test/named-query?str=abc").await, "nice abc");
    assert_eq!(
        get(&router, "/test/named-query?id=abc").await.status,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_header_params() {
    let router = router();
    assert_ok(&get_with_header(&router, "/test/int-header", "id", "3").await, "nice 3");
    assert_eq!(get(&router, "/test/int-header").await.status, StatusCode::BAD_REQUEST);

    assert_ok(&get(&router, "/test/optional-header").await, "nice null");
    assert_ok(
        &get_with_header(&router, "/test/optional-header", "label", "red").await,
        "nice red",
    );

    assert_ok(
        &get_with_header(&router, "/test/named-header", "str", "abc").await,
        "nice abc",
    );
}

#[tokio::test]
async fn test_pipeline_param_sees_the_call() {
    let router = router();
    assert_ok(&get(&router, "/test/pipeline").await, "nice GET /test/pipeline");
}

#[tokio::test]
async fn test_providers_in_any_position() {
    let router = router();
    assert_ok(&get(&router, "/test/provider-first/6").await, "nice 48");
    assert_ok(&get(&router, "/test/provider-last/6").await, "nice 48");
}

#[tokio::test]
async fn test_missing_provider_is_a_bad_request() {
    let router = router();
    let response = get(&router, "/test/missing-provider").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body_text().contains("Unprovided"), "{}", response.body_text());
}

#[tokio::test]
async fn test_catalog_crud() {
    let store = Store::new();
    let router = build_router(&store);

    let created = router
        .dispatch(CallContext::new(Method::POST, "/catalog/books").with_body(
            r#"{"title":"Dune","author":"Herbert","shelf":"scifi","added":"2021-03-04"}"#,
        ))
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body_text());
    assert_eq!(created.body["id"], 1);
    assert_eq!(created.body["added"], "2021-03-04");

    let fetched = get(&router, "/catalog/books/1").await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["title"], "Dune");
    assert_eq!(
        fetched.get_header("content-type"),
        Some("application/json")
    );

    let removed = router
        .dispatch(CallContext::new(Method::DELETE, "/catalog/books/1"))
        .await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.body_text(), "");

    assert_eq!(get(&router, "/catalog/books/1").await.status, StatusCode::NOT_FOUND);
    let again = router
        .dispatch(CallContext::new(Method::DELETE, "/catalog/books/1"))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_rejects_malformed_body() {
    let router = router();
    let response = router
        .dispatch(CallContext::new(Method::POST, "/catalog/books").with_body(r#"{"title":1}"#))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_listing_and_shelves() {
    let store = Store::new();
    for (title, author, shelf, added) in [
        ("Dune", "Herbert", "scifi", (2021, 3, 4)),
        ("Emma", "Austen", "classics", (2021, 5, 1)),
        ("Children of Dune", "Herbert", "scifi", (2022, 1, 10)),
        ("Solaris", "Lem", "sci fi", (2021, 7, 7)),
    ] {
        store.add(bookshelf::types::NewBook {
            title: title.to_string(),
            author: author.to_string(),
            shelf: shelf.to_string(),
            added: IsoDate::new(added.0, added.1, added.2).unwrap(),
        });
    }
    let router = build_router(&store);

    let all = get(&router, "/catalog/books").await;
    assert_eq!(all.body.as_array().unwrap().len(), 4);

    let herbert = get(&router, "/catalog/books?author=Herbert&limit=1").await;
    let herbert = herbert.body.as_array().unwrap();
    assert_eq!(herbert.len(), 1);
    assert_eq!(herbert[0]["title"], "Dune");

    let scifi = get(&router, "/catalog/shelves/scifi/books").await;
    assert_eq!(scifi.body.as_array().unwrap().len(), 2);

    let recent = get(&router, "/catalog/shelves/scifi/books/20220101").await;
    let recent = recent.body.as_array().unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0]["title"], "Children of Dune");

    // An optional segment that does not convert is treated as absent.
    let unparsed = get(&router, "/catalog/shelves/scifi/books/yesterday").await;
    assert_eq!(unparsed.status, StatusCode::OK);
    assert_eq!(unparsed.body, scifi.body);

    let spaced = get(&router, "/catalog/shelves/sci%20fi/books").await;
    let spaced = spaced.body.as_array().unwrap();
    assert_eq!(spaced.len(), 1);
    assert_eq!(spaced[0]["title"], "Solaris");

    assert_eq!(
        get(&router, "/catalog/books/first").await.status,
        StatusCode::BAD_REQUEST
    );
}

#[test]
fn test_date_converter_round_trip() {
    let converter = IsoDateConverter;
    let date = converter.from_string("20210304").unwrap();
    assert_eq!(Converter::to_string(&converter, &date), "2021-03-04");
    assert_eq!(converter.from_string("2021-03-04"), Some(date));
    assert_eq!(converter.from_string("2021-02-30"), None);
}

#[test]
fn test_route_table_lists_every_route() {
    let table = router().route_table();
    assert_eq!(table.len(), 22);
    assert!(table.contains(&(Method::GET, "/catalog/shelves/{shelf}/books/{since?}".to_string())));
}
