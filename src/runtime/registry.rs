//! Converter and provider registries.
//!
//! Both are keyed by [`TypeId`] and populated by the host before routes are
//! registered; afterwards they are frozen behind `Arc` and only read.

use super::context::CallContext;
use futures::future::BoxFuture;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

/// Two-way conversion between a value and its text form in a URL or header.
pub trait Converter<T>: Send + Sync {
    /// `None` when `raw` is not a valid `T`.
    fn from_string(&self, raw: &str) -> Option<T>;

    fn to_string(&self, value: &T) -> String;
}

/// Converter for any `T: FromStr + Display`.
pub struct FromStrConverter<T>(PhantomData<fn() -> T>);

impl<T> FromStrConverter<T> {
    #[must_use]
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for FromStrConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Converter<T> for FromStrConverter<T>
where
    T: FromStr + fmt::Display,
{
    fn from_string(&self, raw: &str) -> Option<T> {
        raw.parse().ok()
    }

    fn to_string(&self, value: &T) -> String {
        value.to_string()
    }
}

/// Converter built from a parse closure and a render closure.
pub struct FnConverter<P, R> {
    parse: P,
    render: R,
}

pub fn converter_fn<T, P, R>(parse: P, render: R) -> FnConverter<P, R>
where
    P: Fn(&str) -> Option<T> + Send + Sync,
    R: Fn(&T) -> String + Send + Sync,
{
    FnConverter { parse, render }
}

impl<T, P, R> Converter<T> for FnConverter<P, R>
where
    P: Fn(&str) -> Option<T> + Send + Sync,
    R: Fn(&T) -> String + Send + Sync,
{
    fn from_string(&self, raw: &str) -> Option<T> {
        (self.parse)(raw)
    }

    fn to_string(&self, value: &T) -> String {
        (self.render)(value)
    }
}

/// Supplies a value of `T` for a `#[provided]` parameter.
pub trait Provider<T>: Send + Sync {
    fn provide<'a>(&'a self, ctx: &'a CallContext) -> BoxFuture<'a, T>;
}

/// Provider wrapping an async closure; see [`provider_fn`].
pub struct FnProvider<F>(F);

/// Build a provider from `|ctx| async move { .. }`. The returned future may
/// not borrow the context; copy what it needs out first.
pub fn provider_fn<F>(f: F) -> FnProvider<F> {
    FnProvider(f)
}

impl<T, F, Fut> Provider<T> for FnProvider<F>
where
    F: Fn(&CallContext) -> Fut + Send + Sync,
    Fut: Future<Output = T> + Send + 'static,
{
    fn provide<'a>(&'a self, ctx: &'a CallContext) -> BoxFuture<'a, T> {
        Box::pin((self.0)(ctx))
    }
}

type Erased = Box<dyn Any + Send + Sync>;

/// Converters keyed by the type they produce.
#[derive(Default)]
pub struct ConverterRegistry {
    converters: HashMap<TypeId, Erased>,
    names: HashMap<TypeId, &'static str>,
}

macro_rules! register_from_str {
    ($registry:ident: $($ty:ty),+ $(,)?) => {
        $( $registry.register::<$ty>(FromStrConverter::<$ty>::new()); )+
    };
}

impl ConverterRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `FromStr` converters for `String`, `bool`, `char`
    /// and every primitive integer and float type.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        register_from_str!(registry:
            String, bool, char,
            i8, i16, i32, i64, i128, isize,
            u8, u16, u32, u64, u128, usize,
            f32, f64,
        );
        registry
    }

    /// Register the converter for `T`, replacing any earlier one.
    pub fn register<T: 'static>(&mut self, converter: impl Converter<T> + 'static) -> &mut Self {
        let shared: Arc<dyn Converter<T>> = Arc::new(converter);
        self.converters.insert(TypeId::of::<T>(), Box::new(shared));
        self.names.insert(TypeId::of::<T>(), type_name::<T>());
        self
    }

    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<Arc<dyn Converter<T>>> {
        self.converters
            .get(&TypeId::of::<T>())?
            .downcast_ref::<Arc<dyn Converter<T>>>()
            .map(Arc::clone)
    }

    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.converters.contains_key(&TypeId::of::<T>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Names of every registered type, sorted.
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.names.values().copied().collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

/// Providers keyed by the type they supply.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<TypeId, Erased>,
    names: HashMap<TypeId, &'static str>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the provider for `T`, replacing any earlier one.
    pub fn register<T: 'static>(&mut self, provider: impl Provider<T> + 'static) -> &mut Self {
        let shared: Arc<dyn Provider<T>> = Arc::new(provider);
        self.providers.insert(TypeId::of::<T>(), Box::new(shared));
        self.names.insert(TypeId::of::<T>(), type_name::<T>());
        self
    }

    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<Arc<dyn Provider<T>>> {
        self.providers
            .get(&TypeId::of::<T>())?
            .downcast_ref::<Arc<dyn Provider<T>>>()
            .map(Arc::clone)
    }

    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.providers.contains_key(&TypeId::of::<T>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.names.values().copied().collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

/// Host-side setup: register converters and providers, then [`freeze`](Self::freeze)
/// and pass the result to the generated registration function.
#[derive(Debug)]
pub struct RoutingConfig {
    converters: ConverterRegistry,
    providers: ProviderRegistry,
}

/// Frozen registries shared by every dispatch unit.
#[derive(Debug, Clone)]
pub struct Registries {
    pub converters: Arc<ConverterRegistry>,
    pub providers: Arc<ProviderRegistry>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutingConfig {
    /// Default converters, no providers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            converters: ConverterRegistry::with_defaults(),
            providers: ProviderRegistry::new(),
        }
    }

    /// Start from no converters at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            converters: ConverterRegistry::new(),
            providers: ProviderRegistry::new(),
        }
    }

    pub fn register_converter<T: 'static>(&mut self, converter: impl Converter<T> + 'static) -> &mut Self {
        self.converters.register(converter);
        self
    }

    pub fn register_provider<T: 'static>(&mut self, provider: impl Provider<T> + 'static) -> &mut Self {
        self.providers.register(provider);
        self
    }

    #[must_use]
    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    #[must_use]
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    #[must_use]
    pub fn freeze(self) -> Registries {
        Registries {
            converters: Arc::new(self.converters),
            providers: Arc::new(self.providers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[derive(Debug, PartialEq)]
    struct Shout(String);

    struct ShoutConverter;

    impl Converter<Shout> for ShoutConverter {
        fn from_string(&self, raw: &str) -> Option<Shout> {
            (!raw.is_empty()).then(|| Shout(raw.to_uppercase()))
        }

        fn to_string(&self, value: &Shout) -> String {
            value.0.to_lowercase()
        }
    }

    #[test]
    fn test_defaults_cover_primitives() {
        let registry = ConverterRegistry::with_defaults();
        let int = registry.get::<i32>().unwrap();
        assert_eq!(int.from_string("42"), Some(42));
        assert_eq!(int.from_string("abc"), None);
        let boolean = registry.get::<bool>().unwrap();
        assert_eq!(boolean.from_string("true"), Some(true));
        assert!(registry.get::<Shout>().is_none());
        assert_eq!(registry.len(), 17);
    }

    #[test]
    fn test_register_custom_converter() {
        let mut config = RoutingConfig::new();
        config.register_converter(ShoutConverter);
        let registries = config.freeze();
        let shout = registries.converters.get::<Shout>().unwrap();
        assert_eq!(shout.from_string("hey"), Some(Shout("HEY".to_string())));
        assert_eq!(Converter::to_string(&*shout, &Shout("HEY".to_string())), "hey");
    }

    #[test]
    fn test_converter_fn() {
        let mut registry = ConverterRegistry::new();
        registry.register(converter_fn(
            |raw: &str| raw.strip_prefix('#').and_then(|n| n.parse::<u32>().ok()),
            |value: &u32| format!("#{value}"),
        ));
        let tag = registry.get::<u32>().unwrap();
        assert_eq!(tag.from_string("#7"), Some(7));
        assert_eq!(Converter::to_string(&*tag, &7), "#7");
    }

    #[tokio::test]
    async fn test_provider_fn() {
        let mut registry = ProviderRegistry::new();
        registry.register(provider_fn(|ctx: &CallContext| {
            let method = ctx.method().clone();
            async move { format!("via {method}") }
        }));
        let ctx = CallContext::new(Method::PUT, "/");
        let provider = registry.get::<String>().unwrap();
        assert_eq!(provider.provide(&ctx).await, "via PUT");
        assert!(registry.get::<i32>().is_none());
        assert_eq!(registry.type_names(), vec!["alloc::string::String"]);
    }
}
