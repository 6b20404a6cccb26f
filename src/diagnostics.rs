//! Compile-time diagnostics.
//!
//! Every stage reports problems as [`CompileError`]s. The driver collects
//! them across all groups and routes into [`Diagnostics`] so a single run
//! reports everything that is wrong; any error fails the build.

use crate::declaration::Location;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("{location}: invalid declaration `{name}`: {reason}")]
    InvalidDeclaration {
        location: Location,
        name: String,
        reason: String,
    },

    #[error("{location}: `{name}` is not reachable from generated code: {reason}")]
    InaccessibleDeclaration {
        location: Location,
        name: String,
        reason: String,
    },

    #[error("{location}: route `{route}`: path parameters do not match the template: {detail}")]
    PathParamMismatch {
        location: Location,
        route: String,
        detail: String,
    },

    #[error("{location}: route `{route}`: at most one body parameter is allowed, found {}", .params.join(", "))]
    TooManyBodyParams {
        location: Location,
        route: String,
        params: Vec<String>,
    },

    #[error("{location}: route `{route}`: at most one pipeline parameter is allowed, found {}", .params.join(", "))]
    TooManyPipelineParams {
        location: Location,
        route: String,
        params: Vec<String>,
    },

    #[error("{location}: route `{route}`: pipeline parameter `{param}` must be `&CallContext`, found `{found}`")]
    InvalidPipelineType {
        location: Location,
        route: String,
        param: String,
        found: String,
    },

    #[error("{location}: route `{route}`: parameter `{param}`: {detail}")]
    NullabilityMismatch {
        location: Location,
        route: String,
        param: String,
        detail: String,
    },

    #[error("{location}: route `{route}`: parameter `{param}`: {detail}")]
    ConflictingBindingMarkers {
        location: Location,
        route: String,
        param: String,
        detail: String,
    },

    #[error("{location}: route `{route}`: parameter `{param}` has type `{expected}` but converter `{converter}` converts {}", .found.join(", "))]
    ConverterTypeMismatch {
        location: Location,
        route: String,
        param: String,
        converter: String,
        expected: String,
        found: Vec<String>,
    },

    #[error("{location}: route `{route}`: parameter `{param}` names converter `{converter}` but no `impl Converter<_> for {converter}` was found")]
    UnknownConverter {
        location: Location,
        route: String,
        param: String,
        converter: String,
    },

    #[error("{location}: route `{route}`: unsupported HTTP method `{method}`")]
    UnsupportedHttpMethod {
        location: Location,
        route: String,
        method: String,
    },

    #[error("{location}: route `{route}`: handler `{handler}` must declare a concrete return type, found `{found}`")]
    MissingReturnType {
        location: Location,
        route: String,
        handler: String,
        found: String,
    },

    #[error("{location}: {message}")]
    Parse { location: Location, message: String },
}

/// Discriminant of a [`CompileError`], handy for matching in tests and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidDeclaration,
    InaccessibleDeclaration,
    PathParamMismatch,
    TooManyBodyParams,
    TooManyPipelineParams,
    InvalidPipelineType,
    NullabilityMismatch,
    ConflictingBindingMarkers,
    ConverterTypeMismatch,
    UnknownConverter,
    UnsupportedHttpMethod,
    MissingReturnType,
    Parse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl CompileError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::InvalidDeclaration { .. } => ErrorKind::InvalidDeclaration,
            CompileError::InaccessibleDeclaration { .. } => ErrorKind::InaccessibleDeclaration,
            CompileError::PathParamMismatch { .. } => ErrorKind::PathParamMismatch,
            CompileError::TooManyBodyParams { .. } => ErrorKind::TooManyBodyParams,
            CompileError::TooManyPipelineParams { .. } => ErrorKind::TooManyPipelineParams,
            CompileError::InvalidPipelineType { .. } => ErrorKind::InvalidPipelineType,
            CompileError::NullabilityMismatch { .. } => ErrorKind::NullabilityMismatch,
            CompileError::ConflictingBindingMarkers { .. } => {
                ErrorKind::ConflictingBindingMarkers
            }
            CompileError::ConverterTypeMismatch { .. } => ErrorKind::ConverterTypeMismatch,
            CompileError::UnknownConverter { .. } => ErrorKind::UnknownConverter,
            CompileError::UnsupportedHttpMethod { .. } => ErrorKind::UnsupportedHttpMethod,
            CompileError::MissingReturnType { .. } => ErrorKind::MissingReturnType,
            CompileError::Parse { .. } => ErrorKind::Parse,
        }
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        match self {
            CompileError::InvalidDeclaration { location, .. }
            | CompileError::InaccessibleDeclaration { location, .. }
            | CompileError::PathParamMismatch { location, .. }
            | CompileError::TooManyBodyParams { location, .. }
            | CompileError::TooManyPipelineParams { location, .. }
            | CompileError::InvalidPipelineType { location, .. }
            | CompileError::NullabilityMismatch { location, .. }
            | CompileError::ConflictingBindingMarkers { location, .. }
            | CompileError::ConverterTypeMismatch { location, .. }
            | CompileError::UnknownConverter { location, .. }
            | CompileError::UnsupportedHttpMethod { location, .. }
            | CompileError::MissingReturnType { location, .. }
            | CompileError::Parse { location, .. } => location,
        }
    }
}

/// Every error found by one compiler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    errors: Vec<CompileError>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: CompileError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.errors.iter().map(CompileError::kind).collect()
    }

    #[must_use]
    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|error| error.kind() == kind)
    }

    /// `Ok(value)` when nothing was reported.
    pub fn into_result<T>(self, value: T) -> Result<T, Diagnostics> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Multi-line report in the same shape the CLI prints.
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = format!(
            "\n❌ Route compilation failed. {} issue(s) found:\n\n",
            self.errors.len()
        );
        for error in &self.errors {
            out.push_str(&format!("[{}] {}\n", error.kind(), error));
        }
        out.push_str("\nPlease fix the declarations above before building.\n");
        out
    }
}

impl From<CompileError> for Diagnostics {
    fn from(error: CompileError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report())
    }
}

impl std::error::Error for Diagnostics {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lists_every_error() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(CompileError::TooManyBodyParams {
            location: Location::new("routes.rs", 12),
            route: "/books".to_string(),
            params: vec!["a".to_string(), "b".to_string()],
        });
        diagnostics.push(CompileError::UnsupportedHttpMethod {
            location: Location::new("routes.rs", 20),
            route: "/trace".to_string(),
            method: "TRACE".to_string(),
        });
        let report = diagnostics.report();
        assert!(report.contains("2 issue(s) found"));
        assert!(report.contains("[TooManyBodyParams] routes.rs:12"));
        assert!(report.contains("found a, b"));
        assert!(report.contains("[UnsupportedHttpMethod] routes.rs:20"));
        assert_eq!(
            diagnostics.kinds(),
            vec![ErrorKind::TooManyBodyParams, ErrorKind::UnsupportedHttpMethod]
        );
    }

    #[test]
    fn test_into_result() {
        assert_eq!(Diagnostics::new().into_result(3), Ok(3));
        let failing: Diagnostics = CompileError::Parse {
            location: Location::new("x.rs", 1),
            message: "expected item".to_string(),
        }
        .into();
        assert!(failing.into_result(()).is_err());
    }
}
