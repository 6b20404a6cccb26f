use bookshelf::build_router;
use bookshelf::types::Store;
use routecraft::runtime::{CallContext, Method};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store = Store::new();
    let router = build_router(&store);
    router.dump_routes();

    let requests = vec![
        CallContext::new(Method::GET, "/test/without-params"),
        CallContext::new(Method::GET, "/test/int-path/7"),
        CallContext::new(Method::GET, "/test/registered-converter/2021-03-01"),
        CallContext::new(Method::POST, "/catalog/books").with_body(
            r#"{"title":"Dune","author":"Frank Herbert","shelf":"sf","added":"2024-05-01"}"#,
        ),
        CallContext::new(Method::GET, "/catalog/books?author=Frank%20Herbert"),
        CallContext::new(Method::GET, "/catalog/shelves/sf/books/20240101"),
        CallContext::new(Method::GET, "/test/missing-provider"),
        CallContext::new(Method::GET, "/does/not/exist"),
    ];

    for ctx in requests {
        let line = format!("{} {}", ctx.method(), ctx.path());
        let response = router.dispatch(ctx).await;
        println!("{line} -> {} {}", response.status, response.body_text());
    }
    Ok(())
}
