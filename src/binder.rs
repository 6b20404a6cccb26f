//! Parameter binding and validation.
//!
//! Classifies every handler parameter into a [`BindingKind`]:
//!
//! 1. placeholders of the path template are matched to parameters by bound
//!    name (a `#[path("x")]` override or the parameter's own name); only
//!    `#[path]` and unmarked parameters are eligible
//! 2. the rest are classified by precedence PROVIDED, PIPELINE, QUERY/HEADER,
//!    and anything left over is BODY
//! 3. at most one BODY and one PIPELINE survive, PIPELINE must be
//!    `&CallContext`, and required-ness must agree with `Option<T>`
//!
//! The result keeps declaration positions so arguments are passed back in
//! the order the handler declares them.

use crate::declaration::{DeclParam, FnSignature, Location, ParamMarker};
use crate::diagnostics::CompileError;
use crate::model::{BindingKind, BoundParam, PathTemplate};
use std::collections::BTreeSet;

/// The route a set of parameters belongs to, for error context.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    pub route: &'a str,
    pub handler: &'a str,
    pub location: &'a Location,
}

impl RouteContext<'_> {
    fn route(&self) -> String {
        self.route.to_string()
    }

    fn location(&self) -> Location {
        self.location.clone()
    }
}

/// A parameter with its binding marker resolved, before classification.
struct Candidate<'s> {
    name: String,
    binding: Option<&'s ParamMarker>,
    converter: Option<String>,
    param: &'s DeclParam,
}

impl Candidate<'_> {
    /// Name used for path matching and for query/header lookup.
    fn bound_name(&self) -> String {
        let explicit = match self.binding {
            Some(ParamMarker::Path(name) | ParamMarker::Query(name) | ParamMarker::Header(name)) => {
                name.clone()
            }
            _ => None,
        };
        explicit.unwrap_or_else(|| self.name.clone())
    }

    fn path_eligible(&self) -> bool {
        matches!(self.binding, None | Some(ParamMarker::Path(_)))
    }

    fn into_bound(self, kind: BindingKind, required: bool) -> BoundParam {
        BoundParam {
            bound_name: self.bound_name(),
            name: self.name,
            ty: self.param.desc.clone(),
            position: self.param.position,
            kind,
            required,
            converter: self.converter,
        }
    }
}

/// Classify and validate the parameters of one handler.
pub fn bind_params(
    ctx: RouteContext<'_>,
    signature: &FnSignature,
) -> Result<Vec<BoundParam>, CompileError> {
    if signature.has_receiver {
        return Err(CompileError::InvalidDeclaration {
            location: ctx.location(),
            name: ctx.handler.to_string(),
            reason: "handlers must be free functions without a `self` receiver".to_string(),
        });
    }
    if signature.has_generics {
        return Err(CompileError::InvalidDeclaration {
            location: ctx.location(),
            name: ctx.handler.to_string(),
            reason: "handlers may not declare type or const generics".to_string(),
        });
    }

    let mut pool = Vec::with_capacity(signature.params.len());
    for param in &signature.params {
        pool.push(candidate(ctx, param)?);
    }

    let template = PathTemplate::parse(ctx.route);
    let mut seen = BTreeSet::new();
    for (name, _) in template.placeholders() {
        if !seen.insert(name) {
            return Err(mismatch(ctx, format!("placeholder `{{{name}}}` appears more than once")));
        }
    }

    let mut bound = Vec::with_capacity(pool.len());

    // 1. path placeholders
    for (name, optional) in template.placeholders() {
        let Some(idx) = pool
            .iter()
            .position(|c| c.path_eligible() && c.bound_name() == name)
        else {
            return Err(mismatch(
                ctx,
                format!("placeholder `{{{name}}}` has no matching parameter"),
            ));
        };
        let candidate = pool.remove(idx);
        check_nullability(ctx, &candidate, !optional)?;
        bound.push(candidate.into_bound(BindingKind::Path, !optional));
    }
    if let Some(stray) = pool
        .iter()
        .find(|c| matches!(c.binding, Some(ParamMarker::Path(_))))
    {
        return Err(mismatch(
            ctx,
            format!(
                "parameter `{}` is bound to `{{{}}}`, which the path does not declare",
                stray.name,
                stray.bound_name()
            ),
        ));
    }

    // 2. classification by precedence
    let mut bodies = Vec::new();
    let mut pipelines = Vec::new();
    for candidate in pool {
        match candidate.binding {
            Some(ParamMarker::Provided) => {
                reject_converter(ctx, &candidate, BindingKind::Provided)?;
                bound.push(candidate.into_bound(BindingKind::Provided, true));
            }
            Some(ParamMarker::Pipeline) => {
                reject_converter(ctx, &candidate, BindingKind::Pipeline)?;
                pipelines.push(candidate);
            }
            Some(ParamMarker::Query(_)) => {
                let required = !candidate.param.desc.is_nullable();
                check_nullability(ctx, &candidate, required)?;
                bound.push(candidate.into_bound(BindingKind::Query, required));
            }
            Some(ParamMarker::Header(_)) => {
                let required = !candidate.param.desc.is_nullable();
                check_nullability(ctx, &candidate, required)?;
                bound.push(candidate.into_bound(BindingKind::Header, required));
            }
            _ => {
                reject_converter(ctx, &candidate, BindingKind::Body)?;
                bodies.push(candidate);
            }
        }
    }

    // 3. cardinality and pipeline type
    if pipelines.len() > 1 {
        return Err(CompileError::TooManyPipelineParams {
            location: ctx.location(),
            route: ctx.route(),
            params: pipelines.iter().map(|c| c.name.clone()).collect(),
        });
    }
    if bodies.len() > 1 {
        return Err(CompileError::TooManyBodyParams {
            location: ctx.location(),
            route: ctx.route(),
            params: bodies.iter().map(|c| c.name.clone()).collect(),
        });
    }
    if let Some(pipeline) = pipelines.pop() {
        if !is_context_handle(&pipeline.param.ty) {
            return Err(CompileError::InvalidPipelineType {
                location: ctx.location(),
                route: ctx.route(),
                param: pipeline.name.clone(),
                found: pipeline.param.desc.canonical().to_string(),
            });
        }
        bound.push(pipeline.into_bound(BindingKind::Pipeline, true));
    }
    if let Some(body) = bodies.pop() {
        bound.push(body.into_bound(BindingKind::Body, true));
    }

    bound.sort_by_key(|param| param.position);
    Ok(bound)
}

fn candidate<'s>(ctx: RouteContext<'_>, param: &'s DeclParam) -> Result<Candidate<'s>, CompileError> {
    let Some(name) = param.name.clone() else {
        return Err(CompileError::InvalidDeclaration {
            location: ctx.location(),
            name: ctx.handler.to_string(),
            reason: format!(
                "parameter {} must be a plain identifier pattern",
                param.position + 1
            ),
        });
    };
    let bindings: Vec<&ParamMarker> = param.markers.iter().filter(|m| m.is_binding()).collect();
    if bindings.len() > 1 {
        let labels: Vec<&str> = bindings.iter().map(|m| m.label()).collect();
        return Err(CompileError::ConflictingBindingMarkers {
            location: ctx.location(),
            route: ctx.route(),
            param: name,
            detail: format!("carries more than one binding marker: {}", labels.join(", ")),
        });
    }
    let converters: Vec<&String> = param
        .markers
        .iter()
        .filter_map(|m| match m {
            ParamMarker::Convert(path) => Some(path),
            _ => None,
        })
        .collect();
    if converters.len() > 1 {
        return Err(CompileError::ConflictingBindingMarkers {
            location: ctx.location(),
            route: ctx.route(),
            param: name,
            detail: "names more than one converter".to_string(),
        });
    }
    Ok(Candidate {
        name,
        binding: bindings.first().copied(),
        converter: converters.first().map(|c| (*c).clone()),
        param,
    })
}

fn mismatch(ctx: RouteContext<'_>, detail: String) -> CompileError {
    CompileError::PathParamMismatch {
        location: ctx.location(),
        route: ctx.route(),
        detail,
    }
}

fn reject_converter(ctx: RouteContext<'_>, candidate: &Candidate<'_>, kind: BindingKind) -> Result<(), CompileError> {
    match &candidate.converter {
        Some(converter) => Err(CompileError::ConflictingBindingMarkers {
            location: ctx.location(),
            route: ctx.route(),
            param: candidate.name.clone(),
            detail: format!("#[convert({converter})] only applies to PATH, QUERY or HEADER parameters, this one is {kind}"),
        }),
        None => Ok(()),
    }
}

fn check_nullability(ctx: RouteContext<'_>, candidate: &Candidate<'_>, required: bool) -> Result<(), CompileError> {
    let nullable = candidate.param.desc.is_nullable();
    let detail = match (required, nullable) {
        (true, true) => format!(
            "declared `{}` but `{{{}}}` is not optional in the path; write `{{{}?}}`",
            candidate.param.desc,
            candidate.bound_name(),
            candidate.bound_name()
        ),
        (false, false) => format!(
            "`{{{}?}}` is optional in the path, so the parameter must be `Option<{}>`",
            candidate.bound_name(),
            candidate.param.desc
        ),
        _ => return Ok(()),
    };
    Err(CompileError::NullabilityMismatch {
        location: ctx.location(),
        route: ctx.route(),
        param: candidate.name.clone(),
        detail,
    })
}

/// `&CallContext` under any path, shared and without generic arguments.
#[must_use]
pub fn is_context_handle(ty: &syn::Type) -> bool {
    let syn::Type::Reference(reference) = ty else {
        return false;
    };
    if reference.mutability.is_some() {
        return false;
    }
    let syn::Type::Path(path) = &*reference.elem else {
        return false;
    };
    path.qself.is_none()
        && path
            .path
            .segments
            .last()
            .is_some_and(|seg| seg.ident == "CallContext" && seg.arguments.is_none())
}
