use super::response::HandlerResponse;
use http::StatusCode;
use std::fmt;

/// Which part of the request a text-sourced parameter was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    Path,
    Query,
    Header,
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamSource::Path => "path",
            ParamSource::Query => "query",
            ParamSource::Header => "header",
        })
    }
}

/// Request-time failures of a dispatch unit.
///
/// Everything except [`DispatchError::Handler`] and
/// [`DispatchError::ResponseSerialization`] happens before the handler runs.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{location} parameter `{name}` is missing or invalid")]
    MissingOrInvalidParameter {
        name: &'static str,
        location: ParamSource,
    },

    #[error("no converter registered for `{type_name}`")]
    MissingConverter { type_name: &'static str },

    #[error("no provider registered for `{type_name}`")]
    MissingProvider { type_name: &'static str },

    #[error("request body is not a valid `{type_name}`: {reason}")]
    MalformedBody {
        type_name: &'static str,
        reason: String,
    },

    #[error("response could not be serialized: {0}")]
    ResponseSerialization(#[from] serde_json::Error),

    #[error("handler failed: {0:#}")]
    Handler(anyhow::Error),
}

impl DispatchError {
    /// Wrap a handler's own error; it reaches the engine unchanged.
    ///
    /// Plain errors and `anyhow::Error` (with or without added context) both
    /// keep an inner [`HttpError`] visible to [`DispatchError::status`].
    pub fn handler<E: Into<anyhow::Error>>(err: E) -> Self {
        DispatchError::Handler(err.into())
    }

    /// Status the engine should answer with.
    ///
    /// Parameter, body and registration problems are client errors. Handler
    /// errors carrying an [`HttpError`] use its status, anything else is 500.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::MissingOrInvalidParameter { .. }
            | DispatchError::MissingConverter { .. }
            | DispatchError::MissingProvider { .. }
            | DispatchError::MalformedBody { .. } => StatusCode::BAD_REQUEST,
            DispatchError::ResponseSerialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::Handler(err) => err
                .downcast_ref::<HttpError>()
                .map_or(StatusCode::INTERNAL_SERVER_ERROR, |http| http.status),
        }
    }

    /// A registration the host forgot, as opposed to a bad request.
    #[must_use]
    pub fn is_configuration_gap(&self) -> bool {
        matches!(
            self,
            DispatchError::MissingConverter { .. } | DispatchError::MissingProvider { .. }
        )
    }

    /// Render as an error response. Unclassified handler errors are not
    /// echoed to the client.
    #[must_use]
    pub fn into_response(self) -> HandlerResponse {
        let status = self.status();
        let message = match &self {
            DispatchError::Handler(err) => match err.downcast_ref::<HttpError>() {
                Some(http) => http.message.clone(),
                None => "internal server error".to_string(),
            },
            other => other.to_string(),
        };
        HandlerResponse::error(status, &message)
    }
}

/// A handler error that maps to a specific HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {message}")]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}
