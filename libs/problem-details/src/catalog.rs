//! Problem kind catalog
//!
//! Every problem type that can appear in a response is described by a static
//! [`ProblemKind`]. The [`ProblemCatalog`] collects kinds (and custom codes) so
//! that a resolver can tell which `type` references are legitimate.

use std::collections::BTreeMap;

use http::StatusCode;
use serde::Serialize;

/// Static definition of a problem kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemKind {
    pub status: u16,
    pub code: &'static str,
    pub title: &'static str,
    /// Message used when the error carries no detail of its own.
    pub default_detail: &'static str,
    /// Optional template with `{name}` placeholders, see [`interpolate`].
    pub format_detail: Option<&'static str>,
    /// Human-readable explanation published on the documentation page.
    pub description: &'static str,
}

impl ProblemKind {
    /// HTTP status for this kind, `500` if the declared number is not a valid status.
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Renders the detail template with the given named parameters, or falls
    /// back to the default detail when the kind has no template.
    #[must_use]
    pub fn render_detail(&self, params: &[(&str, &str)]) -> String {
        self.format_detail.map_or_else(
            || self.default_detail.to_owned(),
            |template| interpolate(template, params),
        )
    }

    /// Kinds whose status depends on whether the host can issue an
    /// authentication challenge.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        self.code == NOT_AUTHENTICATED.code || self.code == AUTHENTICATION_FAILED.code
    }
}

/// Replaces every `{name}` placeholder with its value in a single pass.
/// Values are copied verbatim; unknown placeholders stay as-is.
#[must_use]
pub fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substitution = after.find('}').and_then(|close| {
            let name = &after[..close];
            params
                .iter()
                .find(|(param, _)| *param == name)
                .map(|(_, value)| (close, *value))
        });
        if let Some((close, value)) = substitution {
            out.push_str(value);
            rest = &after[close + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

pub const SERVER_ERROR: ProblemKind = ProblemKind {
    status: 500,
    code: "error",
    title: "A server error occurred.",
    default_detail: "A server error occurred.",
    format_detail: None,
    description: "The server failed to process the request because of an unexpected condition.",
};

pub const PARSE_ERROR: ProblemKind = ProblemKind {
    status: 400,
    code: "parse_error",
    title: "Malformed request.",
    default_detail: "Malformed request.",
    format_detail: None,
    description: "The request body could not be parsed.",
};

pub const VALIDATION_ERROR: ProblemKind = ProblemKind {
    status: 400,
    code: "invalid",
    title: "Invalid input.",
    default_detail: "Invalid input.",
    format_detail: None,
    description: "One or more fields of the request failed validation.",
};

pub const AUTHENTICATION_FAILED: ProblemKind = ProblemKind {
    status: 401,
    code: "authentication_failed",
    title: "Incorrect authentication credentials.",
    default_detail: "Incorrect authentication credentials.",
    format_detail: None,
    description: "The supplied credentials were rejected.",
};

pub const NOT_AUTHENTICATED: ProblemKind = ProblemKind {
    status: 401,
    code: "not_authenticated",
    title: "Authentication credentials were not provided.",
    default_detail: "Authentication credentials were not provided.",
    format_detail: None,
    description: "The endpoint requires credentials and none were sent with the request.",
};

pub const PERMISSION_DENIED: ProblemKind = ProblemKind {
    status: 403,
    code: "permission_denied",
    title: "Permission Denied",
    default_detail: "You do not have permission to perform this action.",
    format_detail: None,
    description: "The caller is not allowed to perform the requested action.",
};

pub const NOT_FOUND: ProblemKind = ProblemKind {
    status: 404,
    code: "not_found",
    title: "Not Found",
    default_detail: "Not found.",
    format_detail: None,
    description: "The requested resource does not exist.",
};

pub const METHOD_NOT_ALLOWED: ProblemKind = ProblemKind {
    status: 405,
    code: "method_not_allowed",
    title: "Method not allowed.",
    default_detail: "Method not allowed.",
    format_detail: Some("Method \"{method}\" not allowed."),
    description: "The resource does not support the HTTP method used.",
};

pub const NOT_ACCEPTABLE: ProblemKind = ProblemKind {
    status: 406,
    code: "not_acceptable",
    title: "Could not satisfy the request Accept header.",
    default_detail: "Could not satisfy the request Accept header.",
    format_detail: None,
    description: "None of the media types in the Accept header can be produced.",
};

pub const UNSUPPORTED_MEDIA_TYPE: ProblemKind = ProblemKind {
    status: 415,
    code: "unsupported_media_type",
    title: "Unsupported media type in request.",
    default_detail: "Unsupported media type in request.",
    format_detail: Some("Unsupported media type \"{media_type}\" in request."),
    description: "The request body uses a media type the endpoint does not accept.",
};

pub const THROTTLED: ProblemKind = ProblemKind {
    status: 429,
    code: "throttled",
    title: "Request was throttled.",
    default_detail: "Request was throttled.",
    format_detail: Some("Request was throttled. Expected available in {wait} seconds."),
    description: "Too many requests were sent in a given amount of time.",
};

pub const INVALID_VERSION: ProblemKind = ProblemKind {
    status: 406,
    code: "invalid_version",
    title: "Invalid API version provided.",
    default_detail: "Invalid API version provided.",
    format_detail: Some("Provided version \"{request_version}\" is invalid."),
    description: "Malformed or unsupported version string is provided with the request.",
};

pub const DEPRECATED_VERSION: ProblemKind = ProblemKind {
    status: 403,
    code: "deprecated_version",
    title: "Deprecated API version provided.",
    default_detail: "Deprecated API version provided.",
    format_detail: Some(
        "Minimum version supported is \"{min_version}\", but the request used \"{request_version}\"",
    ),
    description: "API only supports versions above the minimum requirement.",
};

/// All kinds known out of the box.
pub const BUILTIN_KINDS: &[ProblemKind] = &[
    SERVER_ERROR,
    PARSE_ERROR,
    VALIDATION_ERROR,
    AUTHENTICATION_FAILED,
    NOT_AUTHENTICATED,
    PERMISSION_DENIED,
    NOT_FOUND,
    METHOD_NOT_ALLOWED,
    NOT_ACCEPTABLE,
    UNSUPPORTED_MEDIA_TYPE,
    THROTTLED,
    INVALID_VERSION,
    DEPRECATED_VERSION,
];

/// Registered problem type, as published by documentation pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub code: String,
    pub title: String,
    pub description: String,
}

impl From<&ProblemKind> for CatalogEntry {
    fn from(kind: &ProblemKind) -> Self {
        Self {
            code: kind.code.to_owned(),
            title: kind.title.to_owned(),
            description: kind.description.to_owned(),
        }
    }
}

/// Registry of problem codes that may be used as `type` references.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ProblemCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl ProblemCatalog {
    /// Empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-populated with [`BUILTIN_KINDS`].
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        for kind in BUILTIN_KINDS {
            catalog.register(kind);
        }
        catalog
    }

    /// Registers a kind; a later registration of the same code replaces the earlier one.
    pub fn register(&mut self, kind: &ProblemKind) -> &mut Self {
        self.entries.insert(kind.code.to_owned(), kind.into());
        self
    }

    /// Registers a custom code that application errors may set via `with_code`.
    pub fn register_code(
        &mut self,
        code: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> &mut Self {
        let code = code.into();
        self.entries.insert(
            code.clone(),
            CatalogEntry {
                code,
                title: title.into(),
                description: description.into(),
            },
        );
        self
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&CatalogEntry> {
        self.entries.get(code)
    }

    /// Entries ordered by code.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }
}
