use crate::model::TypeDesc;
use std::fmt;

/// File and line a declaration came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub file: String,
    pub line: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Module,
    Function,
    Struct,
    Enum,
    Trait,
    Impl,
    Other,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeclKind::Module => "module",
            DeclKind::Function => "function",
            DeclKind::Struct => "struct",
            DeclKind::Enum => "enum",
            DeclKind::Trait => "trait",
            DeclKind::Impl => "impl block",
            DeclKind::Other => "item",
        })
    }
}

/// Visibility as far as reachability from generated code is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    /// `pub(crate)`, `pub(super)`, `pub(in ..)`.
    Restricted,
    /// No visibility keyword.
    Inherited,
}

impl From<&syn::Visibility> for Visibility {
    fn from(vis: &syn::Visibility) -> Self {
        match vis {
            syn::Visibility::Public(_) => Visibility::Public,
            syn::Visibility::Restricted(_) => Visibility::Restricted,
            syn::Visibility::Inherited => Visibility::Inherited,
        }
    }
}

/// Item-level marker read from an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// `#[route_group("/prefix")]`
    RouteGroup { prefix: String },
    /// `#[get("/p")]` and friends, or `#[route(METHOD, "/p")]`.
    /// `method` is the text as written; validity is checked later.
    Method { method: String, path: String },
}

/// Parameter-level marker read from an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamMarker {
    Path(Option<String>),
    Query(Option<String>),
    Header(Option<String>),
    Body,
    Provided,
    Pipeline,
    /// Converter type path as written.
    Convert(String),
}

impl ParamMarker {
    /// Everything except `#[convert]` selects a binding kind.
    #[must_use]
    pub fn is_binding(&self) -> bool {
        !matches!(self, ParamMarker::Convert(_))
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ParamMarker::Path(_) => "#[path]",
            ParamMarker::Query(_) => "#[query]",
            ParamMarker::Header(_) => "#[header]",
            ParamMarker::Body => "#[body]",
            ParamMarker::Provided => "#[provided]",
            ParamMarker::Pipeline => "#[pipeline]",
            ParamMarker::Convert(_) => "#[convert]",
        }
    }
}

/// One typed function parameter.
#[derive(Debug, Clone)]
pub struct DeclParam {
    /// `None` when the pattern is not a plain identifier.
    pub name: Option<String>,
    pub ty: syn::Type,
    pub desc: TypeDesc,
    pub position: usize,
    pub markers: Vec<ParamMarker>,
}

#[derive(Debug, Clone)]
pub enum ReturnDecl {
    /// No `->` at all.
    Default,
    Type(syn::Type),
}

#[derive(Debug, Clone)]
pub struct FnSignature {
    pub params: Vec<DeclParam>,
    pub output: ReturnDecl,
    pub is_async: bool,
    pub has_receiver: bool,
    pub has_generics: bool,
}

/// A node of the declaration graph.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub ident: String,
    pub kind: DeclKind,
    pub visibility: Visibility,
    pub markers: Vec<Marker>,
    pub children: Vec<Declaration>,
    pub signature: Option<FnSignature>,
    /// Modules only: whether the body is inline (`mod x { .. }`).
    pub inline: bool,
    pub location: Location,
}

impl Declaration {
    #[must_use]
    pub fn group_prefix(&self) -> Option<&str> {
        self.markers.iter().find_map(|marker| match marker {
            Marker::RouteGroup { prefix } => Some(prefix.as_str()),
            Marker::Method { .. } => None,
        })
    }

    pub fn method_markers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.markers.iter().filter_map(|marker| match marker {
            Marker::Method { method, path } => Some((method.as_str(), path.as_str())),
            Marker::RouteGroup { .. } => None,
        })
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        self.group_prefix().is_some()
    }
}

/// An `impl Converter<T> for C` block found in the scanned sources.
#[derive(Debug, Clone)]
pub struct ConverterImpl {
    /// Canonical text of `C`.
    pub converter: String,
    /// Canonical text of `T`.
    pub target: String,
    /// Module the impl was declared in.
    pub module_path: String,
    pub location: Location,
}

/// Parsed contents of one source file mounted at a module path.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// Module path the file is mounted at in the host crate, e.g. `crate::routes`.
    pub module_path: String,
    pub file: String,
    pub items: Vec<Declaration>,
}
