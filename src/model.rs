//! Metadata model shared by every compiler stage.
//!
//! The scanner produces [`RouteGroup`]s holding [`RouteMeta`] records; the
//! binder annotates each handler parameter as a [`BoundParam`]; the resolver
//! turns those into [`ParamMeta`] with a [`ValueSource`]. Everything here is
//! immutable once built and consumed once by the emitter.

use quote::ToTokens;
use std::fmt;

/// HTTP methods a handler may be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    /// Parse a method name as written in a marker. Matching is case-insensitive.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    #[must_use]
    pub fn to_method(self) -> http::Method {
        match self {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Delete => http::Method::DELETE,
            HttpMethod::Patch => http::Method::PATCH,
            HttpMethod::Head => http::Method::HEAD,
            HttpMethod::Options => http::Method::OPTIONS,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `/`-separated piece of a [`PathTemplate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder { name: String, optional: bool },
}

/// A full route path split into literal and placeholder segments.
///
/// `{name}` is a required placeholder, `{name?}` an optional one. The raw
/// text is kept verbatim so the emitted registration uses exactly what was
/// declared (prefixes are concatenated without slash normalization).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split('/')
            .map(|segment| {
                let inner = segment
                    .strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'));
                match inner {
                    Some(inner) => match inner.strip_suffix('?') {
                        Some(name) => Segment::Placeholder {
                            name: name.to_string(),
                            optional: true,
                        },
                        None => Segment::Placeholder {
                            name: inner.to_string(),
                            optional: false,
                        },
                    },
                    None => Segment::Literal(segment.to_string()),
                }
            })
            .collect();
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholders in template order as `(name, optional)`.
    pub fn placeholders(&self) -> impl Iterator<Item = (&str, bool)> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder { name, optional } => Some((name.as_str(), *optional)),
            Segment::Literal(_) => None,
        })
    }

    /// Whether the placeholder `name` is optional, `None` when absent.
    #[must_use]
    pub fn is_optional(&self, name: &str) -> Option<bool> {
        self.placeholders()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, optional)| optional)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Canonical text of a token tree: whitespace only where two identifier-like
/// tokens would otherwise merge (`& 'a str` becomes `&'a str`).
#[must_use]
pub fn canonical_tokens<T: ToTokens>(tokens: &T) -> String {
    let text = tokens.to_token_stream().to_string();
    let chars: Vec<char> = text.chars().collect();
    let is_word = |c: char| c.is_alphanumeric() || c == '_' || c == '\'';
    let mut out = String::with_capacity(text.len());
    for (idx, c) in chars.iter().enumerate() {
        if c.is_whitespace() {
            let prev = out.chars().last();
            let next = chars[idx + 1..].iter().find(|n| !n.is_whitespace());
            if let (Some(prev), Some(next)) = (prev, next) {
                if is_word(prev) && is_word(*next) {
                    out.push(' ');
                }
            }
            continue;
        }
        out.push(*c);
    }
    out
}

/// Whether two canonical type strings name the same type.
///
/// Equal text matches, and so does a path that is a `::` suffix of the other
/// (`chrono::NaiveDate` and `NaiveDate`). Nothing else is inferred.
#[must_use]
pub fn types_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let suffix_of = |long: &str, short: &str| {
        long.len() > short.len() + 2
            && long.ends_with(short)
            && long[..long.len() - short.len()].ends_with("::")
    };
    suffix_of(a, b) || suffix_of(b, a)
}

/// Declared type of a handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDesc {
    canonical: String,
    base: String,
    nullable: bool,
}

impl TypeDesc {
    #[must_use]
    pub fn from_type(ty: &syn::Type) -> Self {
        let canonical = canonical_tokens(ty);
        match option_inner(ty) {
            Some(inner) => Self {
                canonical,
                base: canonical_tokens(inner),
                nullable: true,
            },
            None => Self {
                base: canonical.clone(),
                canonical,
                nullable: false,
            },
        }
    }

    /// The full declared type, e.g. `Option<i32>`.
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// The value type a converter must produce: `T` for `Option<T>`, else the declared type.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// `T` when `ty` is `Option<T>` (under any path ending in `Option`).
#[must_use]
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    let syn::Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let last = path.path.segments.last()?;
    if last.ident != "Option" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    let mut types = args.args.iter().filter_map(|arg| match arg {
        syn::GenericArgument::Type(inner) => Some(inner),
        _ => None,
    });
    match (types.next(), types.next()) {
        (Some(inner), None) => Some(inner),
        _ => None,
    }
}

/// Where a handler argument's value comes from at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Path,
    Query,
    Header,
    Body,
    Provided,
    Pipeline,
}

impl BindingKind {
    /// PATH, QUERY and HEADER values arrive as text and need a converter.
    #[must_use]
    pub fn is_string_sourced(&self) -> bool {
        matches!(self, BindingKind::Path | BindingKind::Query | BindingKind::Header)
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BindingKind::Path => "PATH",
            BindingKind::Query => "QUERY",
            BindingKind::Header => "HEADER",
            BindingKind::Body => "BODY",
            BindingKind::Provided => "PROVIDED",
            BindingKind::Pipeline => "PIPELINE",
        })
    }
}

/// A classified, validated parameter before converter resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundParam {
    pub name: String,
    /// Key used to look the value up: placeholder, query key or header name.
    pub bound_name: String,
    pub ty: TypeDesc,
    pub position: usize,
    pub kind: BindingKind,
    pub required: bool,
    /// Converter path exactly as written in `#[convert(..)]`.
    pub converter: Option<String>,
}

/// How the emitted dispatch unit obtains a parameter's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// A named converter, as an absolute Rust path to its unit struct.
    ExplicitConverter { converter: String },
    /// Runtime `ConverterRegistry` lookup keyed by the declared type.
    ConverterRegistry,
    /// Runtime `ProviderRegistry` lookup keyed by the declared type.
    ProviderRegistry,
    /// The request context handle itself.
    Context,
    /// The deserialized request payload.
    Payload,
}

/// A fully resolved handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamMeta {
    pub name: String,
    pub bound_name: String,
    pub ty: TypeDesc,
    pub position: usize,
    pub kind: BindingKind,
    pub required: bool,
    pub source: ValueSource,
}

/// What the handler hands back, as far as response mapping cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// `()` or no return type: 200 with an empty body.
    Unit,
    /// Any serializable value: 200 with the value as body.
    Value,
    /// `Reply<T>`: explicit status and optional payload.
    Reply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnShape {
    pub kind: ReturnKind,
    /// The handler returns `Result<_, E>` and errors propagate to the engine.
    pub fallible: bool,
}

/// Location of the handler function in the host crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRef {
    pub ident: String,
    /// Absolute path, e.g. `crate::routes::items::get_item`.
    pub path: String,
    pub is_async: bool,
}

/// One method-tagged handler owned by exactly one [`RouteGroup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMeta {
    pub method: HttpMethod,
    pub path: PathTemplate,
    pub handler: HandlerRef,
    /// Ordered by declaration position.
    pub params: Vec<ParamMeta>,
    pub returns: ReturnShape,
}

/// A route group and its nested groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGroup {
    pub name: String,
    /// Absolute module path of the group, e.g. `crate::routes::items`.
    pub module_path: String,
    /// Full prefix including every enclosing group's prefix.
    pub prefix: String,
    pub routes: Vec<RouteMeta>,
    pub groups: Vec<RouteGroup>,
}

impl RouteGroup {
    /// Every route of this group and its nested groups, depth-first in
    /// registration order.
    #[must_use]
    pub fn all_routes(&self) -> Vec<&RouteMeta> {
        let mut out: Vec<&RouteMeta> = self.routes.iter().collect();
        for group in &self.groups {
            out.extend(group.all_routes());
        }
        out
    }

    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len() + self.groups.iter().map(RouteGroup::route_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_template_placeholders() {
        let template = PathTemplate::parse("/shelves/{shelf}/books/{id?}");
        let placeholders: Vec<_> = template.placeholders().collect();
        assert_eq!(placeholders, vec![("shelf", false), ("id", true)]);
        assert_eq!(template.is_optional("id"), Some(true));
        assert_eq!(template.is_optional("missing"), None);
        assert_eq!(template.as_str(), "/shelves/{shelf}/books/{id?}");
    }

    #[test]
    fn test_path_template_keeps_double_slash() {
        let template = PathTemplate::parse("/api//ping");
        assert_eq!(template.to_string(), "/api//ping");
        assert_eq!(template.placeholders().count(), 0);
    }

    #[test]
    fn test_canonical_tokens() {
        let ty: syn::Type = syn::parse_quote!(Option < Vec < chrono :: NaiveDate > >);
        assert_eq!(canonical_tokens(&ty), "Option<Vec<chrono::NaiveDate>>");
        let reference: syn::Type = syn::parse_quote!(&'a str);
        assert_eq!(canonical_tokens(&reference), "&'a str");
        let dyn_ty: syn::Type = syn::parse_quote!(Box<dyn Fn() + Send>);
        assert_eq!(canonical_tokens(&dyn_ty), "Box<dyn Fn()+Send>");
    }

    #[test]
    fn test_types_match_by_path_suffix() {
        assert!(types_match("chrono::NaiveDate", "NaiveDate"));
        assert!(types_match("i32", "i32"));
        assert!(!types_match("i32", "i64"));
        assert!(!types_match("MyNaiveDate", "NaiveDate"));
        assert!(!types_match("Vec<chrono::NaiveDate>", "Vec<NaiveDate>"));
    }

    #[test]
    fn test_type_desc_nullable() {
        let ty: syn::Type = syn::parse_quote!(std::option::Option<i32>);
        let desc = TypeDesc::from_type(&ty);
        assert!(desc.is_nullable());
        assert_eq!(desc.base(), "i32");

        let plain: syn::Type = syn::parse_quote!(String);
        let desc = TypeDesc::from_type(&plain);
        assert!(!desc.is_nullable());
        assert_eq!(desc.base(), "String");
    }

    #[test]
    fn test_http_method_parse() {
        assert_eq!(HttpMethod::parse("get"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("OPTIONS"), Some(HttpMethod::Options));
        assert_eq!(HttpMethod::parse("TRACE"), None);
        assert_eq!(HttpMethod::Patch.to_method(), http::Method::PATCH);
    }
}
