use super::error::DispatchError;
use crate::ids::RequestId;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum number of path/query parameters kept inline.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Request parameters as `(name, value)`; names are shared with the route table.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// The request-processing handle a dispatch unit works against.
///
/// The routing engine builds one per request, fills in the path parameters
/// it matched, and hands it to the route's dispatch unit. Handlers that want
/// the raw request declare a `#[pipeline] ctx: &CallContext` parameter.
#[derive(Debug, Clone)]
pub struct CallContext {
    request_id: RequestId,
    method: Method,
    path: String,
    path_params: ParamVec,
    query_params: ParamVec,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl CallContext {
    /// A context for `method` and `uri` (path plus optional `?query`).
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (uri, None),
        };
        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            path_params: ParamVec::new(),
            query_params: query.map(parse_query).unwrap_or_default(),
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Take over an `http::Request`, reusing its `x-request-id` when valid.
    #[must_use]
    pub fn from_request(request: http::Request<Vec<u8>>) -> Self {
        let (parts, body) = request.into_parts();
        let uri = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());
        let mut ctx = Self::new(parts.method, &uri);
        ctx.request_id = RequestId::from_headers(&parts.headers);
        ctx.headers = parts.headers;
        ctx.body = body;
        ctx
    }

    /// Add a header. Names or values that are not valid HTTP are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_path_params(mut self, params: ParamVec) -> Self {
        self.path_params = params;
        self
    }

    /// Replace the path parameters; called by the engine after matching.
    pub fn set_path_params(&mut self, params: ParamVec) {
        self.path_params = params;
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Path parameter by placeholder name; the last occurrence wins.
    #[inline]
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        lookup(&self.path_params, name)
    }

    /// Query parameter by key; the last occurrence wins.
    #[inline]
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        lookup(&self.query_params, name)
    }

    /// First header value under `name` that is valid visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Deserialize the JSON body as `T`.
    ///
    /// An empty body reads as JSON `null`, so `Option<T>` bodies may be omitted.
    pub async fn receive<T: DeserializeOwned>(&self) -> Result<T, DispatchError> {
        let bytes: &[u8] = if self.body.is_empty() { b"null" } else { &self.body };
        serde_json::from_slice(bytes).map_err(|err| DispatchError::MalformedBody {
            type_name: std::any::type_name::<T>(),
            reason: err.to_string(),
        })
    }
}

fn lookup<'a>(params: &'a ParamVec, name: &str) -> Option<&'a str> {
    params
        .iter()
        .rfind(|(k, _)| k.as_ref() == name)
        .map(|(_, v)| v.as_str())
}

fn parse_query(query: &str) -> ParamVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
        .collect()
}
