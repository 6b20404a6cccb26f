//! Marker attributes for routecraft route groups and handlers.
//!
//! The markers carry no runtime behavior. `routecraft-gen` reads them from the
//! source text at build time; these macros only keep the annotated items legal
//! Rust: method markers strip the parameter markers (`#[query]`, `#[body]`, ...)
//! that rustc would otherwise reject, and `#[route_group]` refuses anything
//! that is not an inline module.

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input, FnArg, Ident, Item, ItemFn, LitStr, Result as SynResult, Token,
};

const PARAM_MARKERS: &[&str] = &[
    "path", "query", "header", "body", "provided", "pipeline", "convert",
];

const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

struct PathArg;

impl Parse for PathArg {
    fn parse(input: ParseStream) -> SynResult<Self> {
        if input.is_empty() {
            return Ok(PathArg);
        }
        input.parse::<LitStr>()?;
        if !input.is_empty() {
            return Err(input.error("expected a single string literal path"));
        }
        Ok(PathArg)
    }
}

struct RouteArgs {
    method: Ident,
}

impl Parse for RouteArgs {
    fn parse(input: ParseStream) -> SynResult<Self> {
        let method: Ident = input.parse()?;
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            if !input.is_empty() {
                input.parse::<LitStr>()?;
            }
        }
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
        }
        if !input.is_empty() {
            return Err(input.error("expected `METHOD` or `METHOD, \"/path\"`"));
        }
        Ok(RouteArgs { method })
    }
}

fn is_param_marker(attr: &syn::Attribute) -> bool {
    attr.path()
        .segments
        .last()
        .map(|seg| PARAM_MARKERS.iter().any(|m| seg.ident == *m))
        .unwrap_or(false)
}

fn strip_param_markers(mut func: ItemFn) -> ItemFn {
    for input in func.sig.inputs.iter_mut() {
        if let FnArg::Typed(pat) = input {
            pat.attrs.retain(|attr| !is_param_marker(attr));
        }
    }
    func
}

fn method_marker(attr: TokenStream, item: TokenStream) -> TokenStream {
    parse_macro_input!(attr as PathArg);
    let func = strip_param_markers(parse_macro_input!(item as ItemFn));
    TokenStream::from(quote! { #func })
}

/// Declares an inline module as a route group with an optional path prefix.
#[proc_macro_attribute]
pub fn route_group(attr: TokenStream, item: TokenStream) -> TokenStream {
    parse_macro_input!(attr as PathArg);
    let item = parse_macro_input!(item as Item);
    match &item {
        Item::Mod(module) if module.content.is_some() => TokenStream::from(quote! { #item }),
        Item::Mod(module) => syn::Error::new_spanned(
            &module.ident,
            "#[route_group] requires an inline module so its handlers can be scanned",
        )
        .to_compile_error()
        .into(),
        other => syn::Error::new_spanned(
            other,
            "#[route_group] may only decorate a module (a route group must be a singleton)",
        )
        .to_compile_error()
        .into(),
    }
}

/// Generic method marker: `#[route(TRACE, "/path")]` is rejected, any of the
/// supported methods is accepted.
#[proc_macro_attribute]
pub fn route(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as RouteArgs);
    let method = args.method.to_string();
    if !METHODS.contains(&method.to_ascii_uppercase().as_str()) {
        return syn::Error::new_spanned(
            &args.method,
            format!("unsupported HTTP method `{method}`"),
        )
        .to_compile_error()
        .into();
    }
    let func = strip_param_markers(parse_macro_input!(item as ItemFn));
    TokenStream::from(quote! { #func })
}

#[proc_macro_attribute]
pub fn get(attr: TokenStream, item: TokenStream) -> TokenStream {
    method_marker(attr, item)
}

#[proc_macro_attribute]
pub fn post(attr: TokenStream, item: TokenStream) -> TokenStream {
    method_marker(attr, item)
}

#[proc_macro_attribute]
pub fn put(attr: TokenStream, item: TokenStream) -> TokenStream {
    method_marker(attr, item)
}

#[proc_macro_attribute]
pub fn delete(attr: TokenStream, item: TokenStream) -> TokenStream {
    method_marker(attr, item)
}

#[proc_macro_attribute]
pub fn patch(attr: TokenStream, item: TokenStream) -> TokenStream {
    method_marker(attr, item)
}

#[proc_macro_attribute]
pub fn head(attr: TokenStream, item: TokenStream) -> TokenStream {
    method_marker(attr, item)
}

#[proc_macro_attribute]
pub fn options(attr: TokenStream, item: TokenStream) -> TokenStream {
    method_marker(attr, item)
}
