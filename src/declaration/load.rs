use super::types::{
    ConverterImpl, DeclKind, DeclParam, Declaration, FnSignature, Location, Marker, ParamMarker,
    ReturnDecl, SourceUnit, Visibility,
};
use crate::diagnostics::{CompileError, Diagnostics};
use crate::model::{canonical_tokens, TypeDesc};
use proc_macro2::Span;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned;
use syn::{Attribute, FnArg, Item, LitStr, Meta, Pat, Token};
use tracing::debug;

const METHOD_MARKERS: &[&str] = &["get", "post", "put", "delete", "patch", "head", "options"];

/// Arguments of `#[route(METHOD, "/path")]`.
struct RouteMarkerArgs {
    method: String,
    path: String,
}

impl Parse for RouteMarkerArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let method = syn::Ident::parse_any(input)?.unraw().to_string();
        let mut path = String::new();
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            if input.peek(LitStr) {
                path = input.parse::<LitStr>()?.value();
            }
        }
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
        }
        if !input.is_empty() {
            return Err(input.error("expected `METHOD` or `METHOD, \"/path\"`"));
        }
        Ok(Self { method, path })
    }
}

/// Parse one source file into a [`SourceUnit`] plus the converter impls it declares.
///
/// Syntax errors fail immediately; malformed markers are collected so one
/// pass reports all of them.
pub fn load_source(
    module_path: &str,
    file: &str,
    source: &str,
) -> Result<(SourceUnit, Vec<ConverterImpl>), Diagnostics> {
    let parsed = syn::parse_file(source).map_err(|err| CompileError::Parse {
        location: Location::new(file, line_of(err.span())),
        message: err.to_string(),
    })?;

    let mut loader = Loader {
        file,
        diagnostics: Diagnostics::new(),
        converters: Vec::new(),
    };
    let items = loader.load_items(module_path, &parsed.items);
    debug!(
        file = %file,
        module_path = %module_path,
        items = items.len(),
        converters = loader.converters.len(),
        "Loaded declaration source"
    );
    let unit = SourceUnit {
        module_path: module_path.to_string(),
        file: file.to_string(),
        items,
    };
    let Loader {
        diagnostics,
        converters,
        ..
    } = loader;
    diagnostics.into_result((unit, converters))
}

fn line_of(span: Span) -> usize {
    span.start().line
}

struct Loader<'a> {
    file: &'a str,
    diagnostics: Diagnostics,
    converters: Vec<ConverterImpl>,
}

impl Loader<'_> {
    fn location(&self, span: Span) -> Location {
        Location::new(self.file, line_of(span))
    }

    fn invalid(&mut self, name: &str, location: &Location, reason: String) {
        self.diagnostics.push(CompileError::InvalidDeclaration {
            location: location.clone(),
            name: name.to_string(),
            reason,
        });
    }

    fn load_items(&mut self, module_path: &str, items: &[Item]) -> Vec<Declaration> {
        items
            .iter()
            .filter_map(|item| self.load_item(module_path, item))
            .collect()
    }

    fn load_item(&mut self, module_path: &str, item: &Item) -> Option<Declaration> {
        let (ident, kind, vis, attrs, span) = match item {
            Item::Mod(m) => {
                let ident = m.ident.unraw().to_string();
                let location = self.location(m.ident.span());
                let markers = self.item_markers(&ident, &m.attrs, &location);
                let children = match &m.content {
                    Some((_, items)) => {
                        self.load_items(&format!("{module_path}::{ident}"), items)
                    }
                    None => Vec::new(),
                };
                return Some(Declaration {
                    ident,
                    kind: DeclKind::Module,
                    visibility: Visibility::from(&m.vis),
                    markers,
                    children,
                    signature: None,
                    inline: m.content.is_some(),
                    location,
                });
            }
            Item::Fn(f) => {
                let ident = f.sig.ident.unraw().to_string();
                let location = self.location(f.sig.ident.span());
                let markers = self.item_markers(&ident, &f.attrs, &location);
                let signature = self.load_signature(&ident, &f.sig, &location);
                return Some(Declaration {
                    ident,
                    kind: DeclKind::Function,
                    visibility: Visibility::from(&f.vis),
                    markers,
                    children: Vec::new(),
                    signature: Some(signature),
                    inline: false,
                    location,
                });
            }
            Item::Impl(imp) => {
                self.record_converter(module_path, imp);
                (
                    canonical_tokens(&imp.self_ty),
                    DeclKind::Impl,
                    Visibility::Inherited,
                    &imp.attrs,
                    imp.impl_token.span,
                )
            }
            Item::Struct(s) => (
                s.ident.unraw().to_string(),
                DeclKind::Struct,
                Visibility::from(&s.vis),
                &s.attrs,
                s.ident.span(),
            ),
            Item::Enum(e) => (
                e.ident.unraw().to_string(),
                DeclKind::Enum,
                Visibility::from(&e.vis),
                &e.attrs,
                e.ident.span(),
            ),
            Item::Trait(t) => (
                t.ident.unraw().to_string(),
                DeclKind::Trait,
                Visibility::from(&t.vis),
                &t.attrs,
                t.ident.span(),
            ),
            Item::Const(c) => (
                c.ident.unraw().to_string(),
                DeclKind::Other,
                Visibility::from(&c.vis),
                &c.attrs,
                c.ident.span(),
            ),
            Item::Static(s) => (
                s.ident.unraw().to_string(),
                DeclKind::Other,
                Visibility::from(&s.vis),
                &s.attrs,
                s.ident.span(),
            ),
            Item::Type(t) => (
                t.ident.unraw().to_string(),
                DeclKind::Other,
                Visibility::from(&t.vis),
                &t.attrs,
                t.ident.span(),
            ),
            Item::Union(u) => (
                u.ident.unraw().to_string(),
                DeclKind::Other,
                Visibility::from(&u.vis),
                &u.attrs,
                u.ident.span(),
            ),
            _ => return None,
        };
        let location = self.location(span);
        let markers = self.item_markers(&ident, attrs, &location);
        Some(Declaration {
            ident,
            kind,
            visibility: vis,
            markers,
            children: Vec::new(),
            signature: None,
            inline: false,
            location,
        })
    }

    fn record_converter(&mut self, module_path: &str, imp: &syn::ItemImpl) {
        let Some((_, trait_path, _)) = &imp.trait_ else {
            return;
        };
        let Some(last) = trait_path.segments.last() else {
            return;
        };
        if last.ident != "Converter" {
            return;
        }
        let syn::PathArguments::AngleBracketed(args) = &last.arguments else {
            return;
        };
        let targets: Vec<&syn::Type> = args
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect();
        if let [target] = targets.as_slice() {
            self.converters.push(ConverterImpl {
                converter: canonical_tokens(&imp.self_ty),
                target: canonical_tokens(*target),
                module_path: module_path.to_string(),
                location: self.location(imp.impl_token.span),
            });
        }
    }

    fn item_markers(&mut self, name: &str, attrs: &[Attribute], location: &Location) -> Vec<Marker> {
        let mut markers = Vec::new();
        for attr in attrs {
            let Some(marker) = attr.path().segments.last().map(|seg| seg.ident.to_string()) else {
                continue;
            };
            match marker.as_str() {
                "route_group" => match optional_lit(attr) {
                    Ok(prefix) => markers.push(Marker::RouteGroup { prefix }),
                    Err(err) => self.invalid(name, location, format!("malformed #[route_group]: {err}")),
                },
                "route" => match attr.parse_args::<RouteMarkerArgs>() {
                    Ok(args) => markers.push(Marker::Method {
                        method: args.method,
                        path: args.path,
                    }),
                    Err(err) => self.invalid(name, location, format!("malformed #[route]: {err}")),
                },
                m if METHOD_MARKERS.contains(&m) => match optional_lit(attr) {
                    Ok(path) => markers.push(Marker::Method {
                        method: m.to_ascii_uppercase(),
                        path,
                    }),
                    Err(err) => self.invalid(name, location, format!("malformed #[{m}]: {err}")),
                },
                _ => {}
            }
        }
        markers
    }

    fn load_signature(&mut self, fn_name: &str, sig: &syn::Signature, location: &Location) -> FnSignature {
        let mut params = Vec::new();
        let mut has_receiver = false;
        for input in &sig.inputs {
            match input {
                FnArg::Receiver(_) => has_receiver = true,
                FnArg::Typed(pat_type) => {
                    let name = match &*pat_type.pat {
                        Pat::Ident(pat) => Some(pat.ident.unraw().to_string()),
                        _ => None,
                    };
                    let label = name.clone().unwrap_or_else(|| canonical_tokens(&pat_type.pat));
                    let markers = self.param_markers(fn_name, &label, &pat_type.attrs, location);
                    params.push(DeclParam {
                        name,
                        desc: TypeDesc::from_type(&pat_type.ty),
                        ty: (*pat_type.ty).clone(),
                        position: params.len(),
                        markers,
                    });
                }
            }
        }
        let output = match &sig.output {
            syn::ReturnType::Default => ReturnDecl::Default,
            syn::ReturnType::Type(_, ty) => ReturnDecl::Type((**ty).clone()),
        };
        FnSignature {
            params,
            output,
            is_async: sig.asyncness.is_some(),
            has_receiver,
            has_generics: sig
                .generics
                .params
                .iter()
                .any(|param| !matches!(param, syn::GenericParam::Lifetime(_))),
        }
    }

    fn param_markers(
        &mut self,
        fn_name: &str,
        param: &str,
        attrs: &[Attribute],
        location: &Location,
    ) -> Vec<ParamMarker> {
        let mut markers = Vec::new();
        for attr in attrs {
            let Some(marker) = attr.path().segments.last().map(|seg| seg.ident.to_string()) else {
                continue;
            };
            let parsed = match marker.as_str() {
                "path" => optional_name(attr).map(ParamMarker::Path),
                "query" => optional_name(attr).map(ParamMarker::Query),
                "header" => optional_name(attr).map(ParamMarker::Header),
                "body" => bare(attr).map(|()| ParamMarker::Body),
                "provided" => bare(attr).map(|()| ParamMarker::Provided),
                "pipeline" => bare(attr).map(|()| ParamMarker::Pipeline),
                "convert" => attr
                    .parse_args::<syn::Path>()
                    .map(|path| ParamMarker::Convert(canonical_tokens(&path))),
                _ => continue,
            };
            match parsed {
                Ok(parsed) => markers.push(parsed),
                Err(err) => self.invalid(
                    fn_name,
                    location,
                    format!("parameter `{param}` has a malformed #[{marker}]: {err}"),
                ),
            }
        }
        markers
    }
}

/// `#[m]`, `#[m()]` or `#[m("text")]`; the first two yield an empty string.
fn optional_lit(attr: &Attribute) -> syn::Result<String> {
    match &attr.meta {
        Meta::Path(_) => Ok(String::new()),
        Meta::List(list) if list.tokens.is_empty() => Ok(String::new()),
        Meta::List(_) => attr.parse_args::<LitStr>().map(|lit| lit.value()),
        Meta::NameValue(nv) => Err(syn::Error::new(nv.span(), "expected a parenthesized string literal")),
    }
}

fn optional_name(attr: &Attribute) -> syn::Result<Option<String>> {
    optional_lit(attr).map(|name| if name.is_empty() { None } else { Some(name) })
}

fn bare(attr: &Attribute) -> syn::Result<()> {
    match &attr.meta {
        Meta::Path(_) => Ok(()),
        other => Err(syn::Error::new(other.span(), "this marker takes no arguments")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
        use routecraft::prelude::*;

        #[route_group("/test")]
        pub mod test_routing {
            use routecraft::prelude::*;

            #[get("/items/{id}")]
            pub fn get_item(id: i32, #[query("q")] search: Option<String>) -> String {
                format!("{id} {search:?}")
            }

            #[route(PATCH, "/items")]
            pub async fn patch_item(#[header] token: String, body: Item) {}

            pub struct Upper;

            impl Converter<Shout> for Upper {
                fn from_string(&self, raw: &str) -> Option<Shout> { None }
                fn to_string(&self, value: &Shout) -> String { String::new() }
            }
        }
    "#;

    #[test]
    fn test_loads_groups_handlers_and_markers() {
        let (unit, converters) = load_source("crate::routes", "routes.rs", SOURCE).unwrap();
        let group = unit
            .items
            .iter()
            .find(|item| item.ident == "test_routing")
            .unwrap();
        assert_eq!(group.kind, DeclKind::Module);
        assert!(group.inline);
        assert_eq!(group.group_prefix(), Some("/test"));

        let get_item = group.children.iter().find(|c| c.ident == "get_item").unwrap();
        assert_eq!(
            get_item.method_markers().collect::<Vec<_>>(),
            vec![("GET", "/items/{id}")]
        );
        let sig = get_item.signature.as_ref().unwrap();
        assert_eq!(sig.params.len(), 2);
        assert_eq!(sig.params[1].markers, vec![ParamMarker::Query(Some("q".to_string()))]);
        assert!(sig.params[1].desc.is_nullable());

        let patch_item = group.children.iter().find(|c| c.ident == "patch_item").unwrap();
        assert_eq!(
            patch_item.method_markers().collect::<Vec<_>>(),
            vec![("PATCH", "/items")]
        );
        let sig = patch_item.signature.as_ref().unwrap();
        assert!(sig.is_async);
        assert!(matches!(sig.output, ReturnDecl::Default));
        assert_eq!(sig.params[0].markers, vec![ParamMarker::Header(None)]);

        assert_eq!(converters.len(), 1);
        assert_eq!(converters[0].converter, "Upper");
        assert_eq!(converters[0].target, "Shout");
        assert_eq!(converters[0].module_path, "crate::routes::test_routing");
    }

    #[test]
    fn test_records_line_numbers() {
        let (unit, _) = load_source("crate", "routes.rs", SOURCE).unwrap();
        let group = unit.items.iter().find(|item| item.ident == "test_routing").unwrap();
        assert_eq!(group.location.line, 5);
        assert_eq!(group.location.to_string(), "routes.rs:5");
    }

    #[test]
    fn test_syntax_error_is_parse_diagnostic() {
        let err = load_source("crate", "broken.rs", "pub mod { fn }").unwrap_err();
        assert_eq!(err.kinds(), vec![crate::diagnostics::ErrorKind::Parse]);
    }

    #[test]
    fn test_malformed_marker_is_invalid_declaration() {
        let source = r#"
            #[route_group("/x")]
            pub mod x {
                #[get(42)]
                pub fn bad() {}

                #[get("/y")]
                pub fn also_bad(#[body(json)] payload: String) {}
            }
        "#;
        let err = load_source("crate", "routes.rs", source).unwrap_err();
        assert_eq!(err.len(), 2);
        assert!(err
            .errors()
            .iter()
            .all(|e| e.kind() == crate::diagnostics::ErrorKind::InvalidDeclaration));
    }
}
