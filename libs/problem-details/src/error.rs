//! Errors raised by request handlers.

use std::fmt;

use http::StatusCode;

use crate::catalog::{
    AUTHENTICATION_FAILED, DEPRECATED_VERSION, INVALID_VERSION, METHOD_NOT_ALLOWED,
    NOT_ACCEPTABLE, NOT_AUTHENTICATED, NOT_FOUND, PARSE_ERROR, PERMISSION_DENIED, ProblemKind,
    SERVER_ERROR, THROTTLED, UNSUPPORTED_MEDIA_TYPE, VALIDATION_ERROR,
};
use crate::detail::Detail;

/// Error declared by application code: a catalog kind plus optional overrides.
///
/// The detail defaults to the kind's default message. JSON values, strings and
/// [`ErrorDetail`](crate::detail::ErrorDetail) leaves are accepted and later
/// normalized by the body builder.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ApiError {
    kind: &'static ProblemKind,
    status: Option<StatusCode>,
    title: Option<String>,
    code: Option<String>,
    detail: Detail,
}

impl ApiError {
    pub fn new(kind: &'static ProblemKind) -> Self {
        Self {
            kind,
            status: None,
            title: None,
            code: None,
            detail: Detail::from(kind.default_detail),
        }
    }

    /// Uses the kind's detail template rendered with `params`.
    pub fn with_params(kind: &'static ProblemKind, params: &[(&str, &str)]) -> Self {
        Self::new(kind).with_detail(kind.render_detail(params))
    }

    pub fn with_detail(mut self, detail: impl Into<Detail>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Overrides the code used for the `type` reference and inherited by message leaves.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn kind(&self) -> &'static ProblemKind {
        self.kind
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or_else(|| self.kind.status_code())
    }

    /// Explicit title, else the kind's title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(self.kind.title)
    }

    /// Explicit code, else the kind's code.
    #[must_use]
    pub fn code(&self) -> &str {
        self.code.as_deref().unwrap_or(self.kind.code)
    }

    #[must_use]
    pub fn detail(&self) -> &Detail {
        &self.detail
    }

    pub fn server_error() -> Self {
        Self::new(&SERVER_ERROR)
    }

    pub fn parse_error() -> Self {
        Self::new(&PARSE_ERROR)
    }

    /// Validation failure; `detail` is usually a field → messages mapping.
    pub fn validation(detail: impl Into<Detail>) -> Self {
        Self::new(&VALIDATION_ERROR).with_detail(detail)
    }

    pub fn authentication_failed() -> Self {
        Self::new(&AUTHENTICATION_FAILED)
    }

    pub fn not_authenticated() -> Self {
        Self::new(&NOT_AUTHENTICATED)
    }

    pub fn permission_denied() -> Self {
        Self::new(&PERMISSION_DENIED)
    }

    pub fn not_found() -> Self {
        Self::new(&NOT_FOUND)
    }

    pub fn method_not_allowed(method: &str) -> Self {
        Self::with_params(&METHOD_NOT_ALLOWED, &[("method", method)])
    }

    pub fn not_acceptable() -> Self {
        Self::new(&NOT_ACCEPTABLE)
    }

    pub fn unsupported_media_type(media_type: &str) -> Self {
        Self::with_params(&UNSUPPORTED_MEDIA_TYPE, &[("media_type", media_type)])
    }

    pub fn throttled(wait_seconds: u64) -> Self {
        Self::with_params(&THROTTLED, &[("wait", &wait_seconds.to_string())])
    }

    pub fn invalid_version(request_version: &str) -> Self {
        Self::with_params(&INVALID_VERSION, &[("request_version", request_version)])
    }

    pub fn deprecated_version(request_version: &str, min_version: &str) -> Self {
        Self::with_params(
            &DEPRECATED_VERSION,
            &[
                ("request_version", request_version),
                ("min_version", min_version),
            ],
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Detail::Message(message) => write!(f, "{}: {message}", self.code()),
            other => write!(f, "{}: {}", self.code(), other.to_value()),
        }
    }
}

impl std::error::Error for ApiError {}

/// Any error that reaches the problem boundary.
#[derive(Debug, thiserror::Error)]
pub enum RaisedError {
    /// Platform signal: the route or resource does not exist.
    #[error("resource not found")]
    NotFound,
    /// Platform signal: the caller may not access the resource.
    #[error("permission denied")]
    PermissionDenied,
    /// Platform signal: no credentials were supplied.
    #[error("authentication credentials were not provided")]
    NotAuthenticated,
    #[error(transparent)]
    Declared(#[from] ApiError),
    /// Programming errors and unexpected failures.
    #[error(transparent)]
    Unclassified(#[from] anyhow::Error),
}

impl RaisedError {
    /// Wraps any error as unclassified.
    #[must_use]
    pub fn unclassified<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::Unclassified(err.into())
    }
}
