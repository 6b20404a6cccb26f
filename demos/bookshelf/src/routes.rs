//! Route groups of the bookshelf service.
//!
//! `build.rs` compiles this file with routecraft; the generated
//! `register_routes` is included from `lib.rs`.

/// One route per parameter style the compiler supports.
#[routecraft::route_group("/test")]
pub mod test_routing {
    use crate::types::{Answer, IsoDate, Tag, Unprovided};
    use routecraft::prelude::*;

    fn show<T: std::fmt::Display>(value: Option<T>) -> String {
        value.map_or_else(|| "null".to_string(), |v| v.to_string())
    }

    #[get("/without-params")]
    pub fn without_params() -> &'static str {
        "nice"
    }

    #[get("/failing")]
    pub fn failing() -> Result<String, HttpError> {
        Err(HttpError::not_found("no such thing"))
    }

    #[get("/failing-anyhow")]
    pub fn failing_anyhow() -> anyhow::Result<String> {
        Err(HttpError::not_found("nothing here").into())
    }

    #[get("/int-path/{id}")]
    pub fn int_path(id: i32) -> String {
        format!("nice {id}")
    }

    #[get("/registered-converter/{date}")]
    pub fn registered_converter(date: IsoDate) -> String {
        format!("nice {}", date.day_of_year())
    }

    #[get("/unregistered-converter/{tag}")]
    pub fn unregistered_converter(tag: Tag) -> String {
        format!("nice {}", tag.0)
    }

    #[get("/annotated-converter/{tag}")]
    pub fn annotated_converter(#[convert(crate::types::TagConverter)] tag: Tag) -> String {
        format!("nice {}", tag.0)
    }

    #[get("/int-query")]
    pub fn int_query(#[query] id: i32) -> String {
        format!("nice {id}")
    }

    #[get("/optional-query")]
    pub fn optional_query(#[query] id: Option<i32>) -> String {
        format!("nice {}", show(id))
    }

    #[get("/named-query")]
    pub fn named_query(#[query("str")] id: String) -> String {
        format!("nice {id}")
    }

    #[get("/int-header")]
    pub fn int_header(#[header] id: i32) -> String {
        format!("nice {id}")
    }

    #[get("/optional-header")]
    pub fn optional_header(#[header] label: Option<String>) -> String {
        format!("nice {}", show(label))
    }

    #[get("/named-header")]
    pub fn named_header(#[header("str")] totally_not_str: String) -> String {
        format!("nice {totally_not_str}")
    }

    #[get("/pipeline")]
    pub fn pipeline(#[pipeline] ctx: &CallContext) -> String {
        format!("nice {} {}", ctx.method(), ctx.path())
    }

    #[get("/provider-first/{inc}")]
    pub fn provider_first(#[provided] answer: Answer, inc: i32) -> String {
        format!("nice {}", answer.0 + inc)
    }

    #[get("/provider-last/{inc}")]
    pub async fn provider_last(inc: i32, #[provided] answer: Answer) -> String {
        format!("nice {}", answer.0 + inc)
    }

    #[get("/missing-provider")]
    pub fn missing_provider(#[provided] _value: Unprovided) -> String {
        "unreachable without a provider".to_string()
    }
}

/// The book catalog.
#[routecraft::route_group("/catalog")]
pub mod catalog {
    use crate::types::{Book, NewBook, Store};
    use routecraft::prelude::*;

    #[get("/books")]
    pub async fn list_books(
        #[provided] store: Store,
        #[query] author: Option<String>,
        #[query] limit: Option<usize>,
    ) -> Vec<Book> {
        store.list(author.as_deref(), limit)
    }

    #[post("/books")]
    pub async fn add_book(#[provided] store: Store, book: NewBook) -> Reply<Book> {
        Reply::new(StatusCode::CREATED, Some(store.add(book)))
    }

    #[get("/books/{id}")]
    pub async fn get_book(#[provided] store: Store, id: u64) -> Result<Book, HttpError> {
        store
            .get(id)
            .ok_or_else(|| HttpError::not_found(format!("book {id} not found")))
    }

    #[delete("/books/{id}")]
    pub fn remove_book(#[provided] store: Store, id: u64) -> Result<(), HttpError> {
        if store.remove(id) {
            Ok(())
        } else {
            Err(HttpError::not_found(format!("book {id} not found")))
        }
    }

    /// Books grouped by shelf.
    #[routecraft::route_group("/shelves")]
    pub mod shelves {
        use crate::types::{Book, IsoDate, Store};
        use routecraft::prelude::*;

        #[get("/{shelf}/books/{since?}")]
        pub async fn shelf_books(
            #[provided] store: Store,
            shelf: String,
            #[convert(crate::types::IsoDateConverter)] since: Option<IsoDate>,
        ) -> Vec<Book> {
            store.on_shelf(&shelf, since)
        }
    }
}
