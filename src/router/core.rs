use crate::runtime::{CallContext, DispatchUnit, HandlerResponse, ParamVec, RouteRegistrar};
use http::{Method, StatusCode};
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Response header echoing the request id of every dispatched request.
pub const REQUEST_ID_RESPONSE_HEADER: &str = "x-request-id";

/// A registered route with its compiled matcher.
#[derive(Clone)]
struct RouteEntry {
    method: Method,
    template: String,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    unit: DispatchUnit,
}

/// Result of matching a request against the routing table.
#[derive(Clone)]
pub struct RouteMatch {
    /// Template the route was registered with, e.g. `/items/{id}`.
    pub template: String,
    /// Placeholder values captured from the request path. Optional
    /// placeholders that matched nothing are absent.
    pub path_params: ParamVec,
    pub unit: DispatchUnit,
}

impl RouteMatch {
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("template", &self.template)
            .field("path_params", &self.path_params)
            .finish_non_exhaustive()
    }
}

/// In-process routing engine for generated routes.
///
/// Routes are tried in registration order; the first whose method and
/// template match wins.
#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<RouteEntry>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.route_table())
            .finish()
    }
}

impl RouteRegistrar for Router {
    fn register(&mut self, method: Method, path: &str, unit: DispatchUnit) {
        let (regex, param_names) = match Self::path_to_regex(path) {
            Ok(compiled) => compiled,
            Err(err) => {
                error!(method = %method, path = %path, error = %err, "Route template rejected");
                return;
            }
        };
        if self
            .routes
            .iter()
            .any(|entry| entry.method == method && entry.template == path)
        {
            warn!(method = %method, path = %path, "Duplicate route; the first registration wins");
        }
        info!(method = %method, path = %path, "Registered route");
        self.routes.push(RouteEntry {
            method,
            template: path.to_string(),
            regex,
            param_names,
            unit,
        });
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// `(method, template)` of every route in registration order.
    #[must_use]
    pub fn route_table(&self) -> Vec<(Method, String)> {
        self.routes
            .iter()
            .map(|entry| (entry.method.clone(), entry.template.clone()))
            .collect()
    }

    /// Print the routing table to stdout.
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.routes.len());
        for (method, template) in self.route_table() {
            println!("[route] {method} {template}");
        }
    }

    /// Find the route for `method` and `path`.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        for entry in self.routes.iter().filter(|entry| entry.method == *method) {
            let Some(captures) = entry.regex.captures(path) else {
                continue;
            };
            let mut path_params = ParamVec::new();
            for (index, name) in entry.param_names.iter().enumerate() {
                if let Some(value) = captures.get(index + 1) {
                    path_params.push((Arc::clone(name), decode_segment(value.as_str())));
                }
            }
            debug!(
                method = %method,
                path = %path,
                route_pattern = %entry.template,
                path_params = ?path_params,
                "Route matched"
            );
            return Some(RouteMatch {
                template: entry.template.clone(),
                path_params,
                unit: Arc::clone(&entry.unit),
            });
        }
        warn!(method = %method, path = %path, "No route matched");
        None
    }

    /// Route and run one request. Unknown routes answer 404; dispatch
    /// failures become their error response.
    pub async fn dispatch(&self, mut ctx: CallContext) -> HandlerResponse {
        let request_id = ctx.request_id();
        let Some(matched) = self.route(ctx.method(), ctx.path()) else {
            let mut response = HandlerResponse::error(StatusCode::NOT_FOUND, "Not Found");
            response.set_header(REQUEST_ID_RESPONSE_HEADER, request_id.to_string());
            return response;
        };
        ctx.set_path_params(matched.path_params);

        let mut response = match (matched.unit)(ctx).await {
            Ok(response) => response,
            Err(err) => {
                let status = err.status();
                if err.is_configuration_gap() {
                    error!(
                        request_id = %request_id,
                        route_pattern = %matched.template,
                        status = status.as_u16(),
                        error = %err,
                        "Routing configuration gap"
                    );
                } else if status.is_server_error() {
                    error!(
                        request_id = %request_id,
                        route_pattern = %matched.template,
                        status = status.as_u16(),
                        error = %err,
                        "Dispatch failed"
                    );
                } else {
                    debug!(
                        request_id = %request_id,
                        route_pattern = %matched.template,
                        status = status.as_u16(),
                        error = %err,
                        "Request rejected"
                    );
                }
                err.into_response()
            }
        };
        response.set_header(REQUEST_ID_RESPONSE_HEADER, request_id.to_string());
        response
    }

    /// Route and run an `http::Request`.
    pub async fn handle(&self, request: http::Request<Vec<u8>>) -> HandlerResponse {
        self.dispatch(CallContext::from_request(request)).await
    }

    /// Compile a path template into a matcher and its placeholder names.
    ///
    /// `{name}` matches one non-empty segment; `{name?}` also matches when
    /// the segment is missing. Empty segments in the template are skipped,
    /// and a template with no segments matches `/`.
    pub(crate) fn path_to_regex(path: &str) -> Result<(Regex, Vec<Arc<str>>), regex::Error> {
        let mut pattern = String::with_capacity(path.len() + 8);
        pattern.push('^');
        let mut param_names = Vec::with_capacity(path.matches('{').count());

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => match name.strip_suffix('?') {
                    Some(name) => {
                        pattern.push_str("(?:/([^/]+))?");
                        param_names.push(Arc::from(name));
                    }
                    None => {
                        pattern.push_str("/([^/]+)");
                        param_names.push(Arc::from(name));
                    }
                },
                None => {
                    pattern.push('/');
                    pattern.push_str(&regex::escape(segment));
                }
            }
        }

        if param_names.is_empty() && pattern.len() == 1 {
            pattern.push('/');
        } else {
            pattern.push_str("/?");
        }
        pattern.push('$');
        Ok((Regex::new(&pattern)?, param_names))
    }
}

/// Percent-decode one captured segment; malformed UTF-8 keeps the raw text.
fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |decoded| decoded.into_owned())
}
