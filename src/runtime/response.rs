use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum number of response headers kept inline.
pub const MAX_INLINE_HEADERS: usize = 8;

/// Response headers; names are shared `Arc<str>` because most are static.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// What a dispatch unit hands back to the routing engine.
///
/// The body is a JSON value: `Null` means no body, a `String` is sent as
/// plain text, anything else as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    #[serde(with = "status_code")]
    pub status: StatusCode,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Status only, no body.
    #[must_use]
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, HeaderVec::new(), Value::Null)
    }

    #[must_use]
    pub fn json(status: StatusCode, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self::new(status, headers, body)
    }

    #[must_use]
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "text/plain; charset=utf-8".to_string()));
        Self::new(status, headers, Value::String(body.into()))
    }

    /// Pick the content type from the shape of a serialized handler value.
    #[must_use]
    pub fn from_value(status: StatusCode, body: Value) -> Self {
        match body {
            Value::Null => Self::empty(status),
            Value::String(text) => Self::text(status, text),
            other => Self::json(status, other),
        }
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header (names compare case-insensitively).
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// The body as it would go on the wire.
    #[must_use]
    pub fn body_text(&self) -> String {
        match &self.body {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

mod status_code {
    use http::StatusCode;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(status.as_u16())
    }
}

/// A handler result carrying an explicit status and an optional payload.
///
/// `data: None` produces the status alone with an empty body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply<T> {
    #[serde(with = "reply_status")]
    pub status: StatusCode,
    pub data: Option<T>,
}

impl<T> Reply<T> {
    #[must_use]
    pub fn new(status: StatusCode, data: Option<T>) -> Self {
        Self { status, data }
    }

    /// 200 with a payload.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, Some(data))
    }

    /// A status without payload.
    #[must_use]
    pub fn status(status: StatusCode) -> Self {
        Self::new(status, None)
    }

    /// Whether the reply carries data.
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.data.is_some()
    }
}

mod reply_status {
    use http::StatusCode;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(status.as_u16())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<StatusCode, D::Error> {
        let code = u16::deserialize(deserializer)?;
        StatusCode::from_u16(code).map_err(serde::de::Error::custom)
    }
}
