//! Per-route dispatch functions.
//!
//! Each route becomes one function of type `DispatchFn`. Inside its future
//! the steps always run in the same order: provided values, text parameters
//! (path, query, header) in declaration order, the pipeline handle, the body,
//! then the handler call with every argument at its declared position, and
//! finally response mapping. Any failing step returns before the handler runs.

use crate::declaration::ReturnDecl;
use crate::model::{BindingKind, ParamMeta, ReturnKind, ReturnShape, RouteMeta, ValueSource};
use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};

/// Map a declared return type onto a [`ReturnShape`].
///
/// `Err` carries the offending type text when the return type does not name
/// a response statically (`_`, `!`, `impl Trait`).
pub fn classify_return(output: &ReturnDecl) -> Result<ReturnShape, String> {
    let ty = match output {
        ReturnDecl::Default => {
            return Ok(ReturnShape {
                kind: ReturnKind::Unit,
                fallible: false,
            })
        }
        ReturnDecl::Type(ty) => ty,
    };
    match result_ok_type(ty) {
        Some(inner) => classify_value(inner).map(|kind| ReturnShape {
            kind,
            fallible: true,
        }),
        None => classify_value(ty).map(|kind| ReturnShape {
            kind,
            fallible: false,
        }),
    }
}

fn classify_value(ty: &syn::Type) -> Result<ReturnKind, String> {
    match ty {
        syn::Type::Tuple(tuple) if tuple.elems.is_empty() => Ok(ReturnKind::Unit),
        syn::Type::Paren(paren) => classify_value(&paren.elem),
        syn::Type::Group(group) => classify_value(&group.elem),
        syn::Type::Infer(_) | syn::Type::Never(_) | syn::Type::ImplTrait(_) => {
            Err(crate::model::canonical_tokens(ty))
        }
        syn::Type::Path(path)
            if path.qself.is_none()
                && path.path.segments.last().is_some_and(|seg| seg.ident == "Reply") =>
        {
            Ok(ReturnKind::Reply)
        }
        _ => Ok(ReturnKind::Value),
    }
}

/// `T` of `Result<T, ..>` under any path ending in `Result`.
fn result_ok_type(ty: &syn::Type) -> Option<&syn::Type> {
    let syn::Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let last = path.path.segments.last()?;
    if last.ident != "Result" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        syn::GenericArgument::Type(inner) => Some(inner),
        _ => None,
    })
}

/// Tokens for a Rust path given as text. Segments that are keywords are
/// emitted as raw identifiers.
#[must_use]
pub fn path_tokens(text: &str) -> TokenStream {
    if let Ok(path) = syn::parse_str::<syn::Path>(text) {
        return quote!(#path);
    }
    let (leading, body) = match text.strip_prefix("::") {
        Some(rest) => (quote!(::), rest),
        None => (TokenStream::new(), text),
    };
    let segments = body.split("::").map(|segment| {
        if syn::parse_str::<Ident>(segment).is_ok()
            || matches!(segment, "crate" | "self" | "super" | "Self")
        {
            Ident::new(segment, Span::call_site())
        } else {
            Ident::new_raw(segment, Span::call_site())
        }
    });
    quote!(#leading #(#segments)::*)
}

fn arg_ident(param: &ParamMeta) -> Ident {
    format_ident!("arg_{}", param.name)
}

fn text_param(param: &ParamMeta, rt: &TokenStream) -> TokenStream {
    let var = arg_ident(param);
    let key = &param.bound_name;
    let (raw, location) = match param.kind {
        BindingKind::Path => (quote!(ctx.path_param(#key)), quote!(#rt::runtime::ParamSource::Path)),
        BindingKind::Query => (quote!(ctx.query_param(#key)), quote!(#rt::runtime::ParamSource::Query)),
        _ => (quote!(ctx.header(#key)), quote!(#rt::runtime::ParamSource::Header)),
    };
    match (&param.source, param.required) {
        (ValueSource::ExplicitConverter { converter }, true) => {
            let converter = path_tokens(converter);
            quote! {
                let #var = #rt::runtime::convert_param_with(&#converter, #raw, #key, #location)?;
            }
        }
        (ValueSource::ExplicitConverter { converter }, false) => {
            let converter = path_tokens(converter);
            quote! {
                let #var = #rt::runtime::convert_optional_param_with(&#converter, #raw);
            }
        }
        (_, true) => quote! {
            let #var = #rt::runtime::convert_param(&converters, #raw, #key, #location)?;
        },
        (_, false) => quote! {
            let #var = #rt::runtime::convert_optional_param(&converters, #raw)?;
        },
    }
}

/// Emit the dispatch function for one route.
#[must_use]
pub fn dispatch_fn(route: &RouteMeta, fn_name: &Ident, rt: &TokenStream) -> TokenStream {
    let mut steps = Vec::with_capacity(route.params.len() + 2);

    for param in route.params.iter().filter(|p| p.kind == BindingKind::Provided) {
        let var = arg_ident(param);
        steps.push(quote! {
            let #var = #rt::runtime::provide(&providers, &ctx).await?;
        });
    }
    for param in route.params.iter().filter(|p| p.kind.is_string_sourced()) {
        steps.push(text_param(param, rt));
    }
    for param in route.params.iter().filter(|p| p.kind == BindingKind::Pipeline) {
        let var = arg_ident(param);
        steps.push(quote! { let #var = &ctx; });
    }
    for param in route.params.iter().filter(|p| p.kind == BindingKind::Body) {
        let var = arg_ident(param);
        steps.push(quote! { let #var = ctx.receive().await?; });
    }

    let handler = path_tokens(&route.handler.path);
    let args = route.params.iter().map(arg_ident);
    let awaited = if route.handler.is_async {
        quote!(.await)
    } else {
        TokenStream::new()
    };
    let call = quote!(#handler(#(#args),*) #awaited);
    let call = if route.returns.fallible {
        quote!(#call.map_err(#rt::runtime::DispatchError::handler)?)
    } else {
        call
    };
    let finish = match route.returns.kind {
        ReturnKind::Unit => quote! {
            #call;
            #rt::runtime::respond_empty()
        },
        ReturnKind::Value => quote! {
            let result = #call;
            #rt::runtime::respond(result)
        },
        ReturnKind::Reply => quote! {
            let result = #call;
            #rt::runtime::respond_reply(result)
        },
    };

    let doc = format!(" {} {} -> {}", route.method, route.path, route.handler.path);
    quote! {
        #[doc = #doc]
        #[allow(unused_variables)]
        fn #fn_name(
            ctx: #rt::runtime::CallContext,
            converters: ::std::sync::Arc<#rt::runtime::ConverterRegistry>,
            providers: ::std::sync::Arc<#rt::runtime::ProviderRegistry>,
        ) -> #rt::runtime::DispatchFuture {
            ::std::boxed::Box::pin(async move {
                #(#steps)*
                #finish
            })
        }
    }
}
