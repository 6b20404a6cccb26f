//! Converter and provider resolution.
//!
//! A PATH/QUERY/HEADER parameter naming `#[convert(C)]` is checked against
//! the `impl Converter<T> for C` blocks of the scanned sources: `T` must be
//! the parameter's value type (`X` for `Option<X>`). Without a named
//! converter the lookup is deferred to the runtime `ConverterRegistry`.
//! PROVIDED parameters always defer to the `ProviderRegistry`; nothing
//! proves at build time that a provider will be registered.

use crate::binder::RouteContext;
use crate::declaration::ConverterImpl;
use crate::diagnostics::CompileError;
use crate::model::{types_match, BindingKind, BoundParam, ParamMeta, ValueSource};

/// Attach a [`ValueSource`] to every bound parameter of one route.
pub fn resolve_params(
    ctx: RouteContext<'_>,
    group_module: &str,
    params: Vec<BoundParam>,
    converters: &[ConverterImpl],
) -> Result<Vec<ParamMeta>, CompileError> {
    params
        .into_iter()
        .map(|param| {
            let source = match param.kind {
                BindingKind::Path | BindingKind::Query | BindingKind::Header => {
                    match &param.converter {
                        Some(written) => explicit_converter(ctx, group_module, &param, written, converters)?,
                        None => ValueSource::ConverterRegistry,
                    }
                }
                BindingKind::Provided => ValueSource::ProviderRegistry,
                BindingKind::Pipeline => ValueSource::Context,
                BindingKind::Body => ValueSource::Payload,
            };
            Ok(ParamMeta {
                name: param.name,
                bound_name: param.bound_name,
                ty: param.ty,
                position: param.position,
                kind: param.kind,
                required: param.required,
                source,
            })
        })
        .collect()
}

fn explicit_converter(
    ctx: RouteContext<'_>,
    group_module: &str,
    param: &BoundParam,
    written: &str,
    converters: &[ConverterImpl],
) -> Result<ValueSource, CompileError> {
    let absolute = absolute_path(group_module, written);
    let candidates: Vec<&ConverterImpl> = converters
        .iter()
        .filter(|imp| absolute_path(&imp.module_path, &imp.converter) == absolute)
        .collect();
    if candidates.is_empty() {
        return Err(CompileError::UnknownConverter {
            location: ctx.location.clone(),
            route: ctx.route.to_string(),
            param: param.name.clone(),
            converter: written.to_string(),
        });
    }
    if candidates
        .iter()
        .any(|imp| types_match(&imp.target, param.ty.base()))
    {
        return Ok(ValueSource::ExplicitConverter { converter: absolute });
    }
    Err(CompileError::ConverterTypeMismatch {
        location: ctx.location.clone(),
        route: ctx.route.to_string(),
        param: param.name.clone(),
        converter: written.to_string(),
        expected: param.ty.base().to_string(),
        found: candidates.iter().map(|imp| format!("`{}`", imp.target)).collect(),
    })
}

/// Make `written` absolute relative to `module`.
///
/// `crate::` and `::` paths are kept, leading `self::` and `super::` are
/// applied to `module`, anything else is taken to live in `module`.
#[must_use]
pub fn absolute_path(module: &str, written: &str) -> String {
    if written.starts_with("crate::") || written.starts_with("::") {
        return written.to_string();
    }
    let mut base: Vec<&str> = module.split("::").collect();
    let mut rest = written;
    loop {
        if let Some(tail) = rest.strip_prefix("self::") {
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("super::") {
            if base.len() > 1 {
                base.pop();
            }
            rest = tail;
        } else {
            break;
        }
    }
    format!("{}::{rest}", base.join("::"))
}
