use super::emit::{dispatch_fn, path_tokens};
use super::templates::RouteDisplay;
use crate::model::RouteGroup;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Items of a generated routes file, before the header frame is added.
pub struct Assembly {
    pub items: TokenStream,
    pub routes: Vec<RouteDisplay>,
}

/// Make `name` unique within `seen` by appending `_1`, `_2`, ...
pub(crate) fn unique_name(seen: &mut HashSet<String>, name: &str) -> String {
    if seen.insert(name.to_string()) {
        return name.to_string();
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{name}_{counter}");
        if seen.insert(candidate.clone()) {
            warn!(name = %name, using = %candidate, "Duplicate generated name");
            return candidate;
        }
        counter += 1;
    }
}

struct Assembler<'a> {
    rt: &'a TokenStream,
    seen: HashSet<String>,
    items: Vec<TokenStream>,
    routes: Vec<RouteDisplay>,
}

impl Assembler<'_> {
    /// Emit the group's registration function and everything under it;
    /// returns the function's identifier.
    fn group(&mut self, group: &RouteGroup, chain: &str) -> Ident {
        let rt = self.rt;
        let register = format_ident!("{}", unique_name(&mut self.seen, &format!("register_{chain}")));
        let mut calls = Vec::with_capacity(group.routes.len() + group.groups.len());

        for route in &group.routes {
            let name = unique_name(
                &mut self.seen,
                &format!("dispatch_{chain}_{}", route.handler.ident),
            );
            let dispatch = format_ident!("{}", name);
            self.items.push(dispatch_fn(route, &dispatch, rt));
            let method = format_ident!("{}", route.method.as_str());
            let path = route.path.as_str();
            calls.push(quote! {
                router.register(
                    #rt::runtime::Method::#method,
                    #path,
                    #rt::runtime::dispatch_unit(converters, providers, #dispatch),
                );
            });
            self.routes.push(RouteDisplay {
                method: route.method.to_string(),
                path: path.to_string(),
                handler: route.handler.path.clone(),
            });
            debug!(method = %route.method, path = %path, dispatch = %name, "Emitted dispatch unit");
        }
        for nested in &group.groups {
            let nested_fn = self.group(nested, &format!("{chain}_{}", nested.name));
            calls.push(quote! { #nested_fn(router, converters, providers); });
        }

        let doc = format!(" Routes of `{}` (prefix `{}`).", group.module_path, group.prefix);
        self.items.push(quote! {
            #[doc = #doc]
            #[allow(unused_variables)]
            fn #register<R>(
                router: &mut R,
                converters: &::std::sync::Arc<#rt::runtime::ConverterRegistry>,
                providers: &::std::sync::Arc<#rt::runtime::ProviderRegistry>,
            )
            where
                R: #rt::runtime::RouteRegistrar + ?Sized,
            {
                #(#calls)*
            }
        });
        register
    }
}

/// Build every dispatch function, one registration function per group and
/// the public entry point named `register_fn`.
pub fn assemble(groups: &[RouteGroup], runtime_path: &str, register_fn: &str) -> Assembly {
    let rt = path_tokens(runtime_path);
    let mut assembler = Assembler {
        rt: &rt,
        seen: HashSet::new(),
        items: Vec::new(),
        routes: Vec::new(),
    };
    assembler.seen.insert(register_fn.to_string());

    let group_fns: Vec<Ident> = groups
        .iter()
        .map(|group| assembler.group(group, &group.name))
        .collect();

    let entry = format_ident!("{}", register_fn);
    let Assembler { items, routes, .. } = assembler;
    let items = quote! {
        /// Register every compiled route against `router`.
        ///
        /// Call once, after all converters and providers are registered.
        #[allow(unused_variables)]
        pub fn #entry<R>(
            router: &mut R,
            converters: ::std::sync::Arc<#rt::runtime::ConverterRegistry>,
            providers: ::std::sync::Arc<#rt::runtime::ProviderRegistry>,
        )
        where
            R: #rt::runtime::RouteRegistrar + ?Sized,
        {
            #( #group_fns(router, &converters, &providers); )*
        }

        #(#items)*
    };
    Assembly { items, routes }
}
