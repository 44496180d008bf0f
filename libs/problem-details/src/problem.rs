//! Problem body assembly (RFC 9457 shaped, pure data model).

use std::collections::BTreeMap;

use http::{HeaderMap, HeaderValue, StatusCode, header};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use url::Url;

use crate::catalog::SERVER_ERROR;
use crate::classify::NormalizedError;
use crate::detail::{ErrorDetail, ErrorTree, PayloadShape, normalize, normalize_members};
use crate::resolver::{ResolveError, TypeResolver};

/// Content type for Problem Details as per RFC 9457.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Members every body carries; mapping payloads may not reuse them.
pub const RESERVED_MEMBERS: [&str; 3] = ["status", "title", "type"];

/// `type` used when no documented reference can be produced.
pub const ABOUT_BLANK: &str = "about:blank";

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("cannot resolve problem type: {0}")]
    UnknownType(#[from] ResolveError),
    #[error("detail member '{0}' collides with a reserved problem member")]
    ReservedMember(String),
}

/// Request data the builder needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Absolute base URL `type` references are resolved against.
    pub base_url: Url,
    /// Challenge for the `WWW-Authenticate` header, if the host issues one.
    pub authenticate_challenge: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            authenticate_challenge: None,
        }
    }

    #[must_use]
    pub fn with_authenticate_challenge(mut self, challenge: impl Into<String>) -> Self {
        self.authenticate_challenge = Some(challenge.into());
        self
    }
}

/// Payload part of a problem body.
#[derive(Debug, Clone, PartialEq)]
pub enum ProblemPayload {
    /// Serialized under `detail`.
    Detail(ErrorDetail),
    /// Serialized under `errors`.
    Errors(Vec<ErrorTree>),
    /// Merged into the top level of the body.
    Members(BTreeMap<String, ErrorTree>),
}

/// Canonical problem body.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ProblemBody {
    pub status: StatusCode,
    pub title: String,
    pub type_url: String,
    pub payload: ProblemPayload,
}

impl ProblemBody {
    /// Body used when the regular one cannot be built.
    pub fn internal_fallback() -> Self {
        Self {
            status: SERVER_ERROR.status_code(),
            title: SERVER_ERROR.title.to_owned(),
            type_url: ABOUT_BLANK.to_owned(),
            payload: ProblemPayload::Detail(ErrorDetail::new(
                SERVER_ERROR.default_detail,
                SERVER_ERROR.code,
            )),
        }
    }

    /// Top-level member names, in serialization order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = RESERVED_MEMBERS.to_vec();
        match &self.payload {
            ProblemPayload::Detail(_) => keys.push("detail"),
            ProblemPayload::Errors(_) => keys.push("errors"),
            ProblemPayload::Members(members) => keys.extend(members.keys().map(String::as_str)),
        }
        keys
    }
}

impl Serialize for ProblemBody {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let extra = match &self.payload {
            ProblemPayload::Members(members) => members.len(),
            ProblemPayload::Detail(_) | ProblemPayload::Errors(_) => 1,
        };
        let mut map = serializer.serialize_map(Some(RESERVED_MEMBERS.len() + extra))?;
        map.serialize_entry("status", &self.status.as_u16())?;
        map.serialize_entry("title", &self.title)?;
        map.serialize_entry("type", &self.type_url)?;
        match &self.payload {
            ProblemPayload::Detail(detail) => map.serialize_entry("detail", detail)?,
            ProblemPayload::Errors(errors) => map.serialize_entry("errors", errors)?,
            ProblemPayload::Members(members) => {
                for (key, value) in members {
                    map.serialize_entry(key, value)?;
                }
            }
        }
        map.end()
    }
}

/// Builds the body for a classified error.
///
/// # Errors
/// [`BuildError::UnknownType`] if the resolver does not know the code,
/// [`BuildError::ReservedMember`] if a mapping payload uses `status`, `title` or `type`.
pub fn build(
    error: &NormalizedError,
    ctx: &RequestContext,
    resolver: &dyn TypeResolver,
) -> Result<ProblemBody, BuildError> {
    let type_url = resolver.resolve(&error.code, &ctx.base_url)?;
    let payload = build_payload(error)?;

    Ok(ProblemBody {
        status: error.status,
        title: error.title.clone(),
        type_url: type_url.into(),
        payload,
    })
}

/// Builds the body with `type` set to `about:blank`, for requests whose base
/// URL cannot be determined. Status, title and payload are kept.
///
/// # Errors
/// [`BuildError::ReservedMember`] if a mapping payload uses `status`, `title` or `type`.
pub fn build_untyped(error: &NormalizedError) -> Result<ProblemBody, BuildError> {
    Ok(ProblemBody {
        status: error.status,
        title: error.title.clone(),
        type_url: ABOUT_BLANK.to_owned(),
        payload: build_payload(error)?,
    })
}

fn build_payload(error: &NormalizedError) -> Result<ProblemPayload, BuildError> {
    let code = error.code.as_str();
    let payload = match PayloadShape::detect(&error.detail) {
        PayloadShape::Scalar { message, code: own } => {
            ProblemPayload::Detail(ErrorDetail::new(message, own.unwrap_or(code)))
        }
        PayloadShape::List(items) => {
            ProblemPayload::Errors(items.iter().map(|item| normalize(item, code)).collect())
        }
        PayloadShape::FlatMap(map) | PayloadShape::NestedMap(map) => {
            if let Some(key) = RESERVED_MEMBERS.iter().find(|k| map.contains_key(**k)) {
                return Err(BuildError::ReservedMember((*key).to_owned()));
            }
            ProblemPayload::Members(normalize_members(map, code))
        }
        PayloadShape::Opaque(Value::Null) => {
            ProblemPayload::Detail(ErrorDetail::new(error.kind.default_detail, code))
        }
        PayloadShape::Opaque(other) => {
            ProblemPayload::Detail(ErrorDetail::new(other.to_string(), code))
        }
    };
    Ok(payload)
}

/// Problem body plus the response headers it travels with.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ProblemResponse {
    pub body: ProblemBody,
    /// Value for `WWW-Authenticate` on 401 responses.
    pub www_authenticate: Option<String>,
}

impl ProblemResponse {
    pub fn new(body: ProblemBody) -> Self {
        Self {
            body,
            www_authenticate: None,
        }
    }

    pub fn internal_fallback() -> Self {
        Self::new(ProblemBody::internal_fallback())
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.body.status
    }

    /// `Content-Type: application/problem+json` and, when set, `WWW-Authenticate`.
    #[must_use]
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        if let Some(challenge) = self
            .www_authenticate
            .as_deref()
            .and_then(|c| HeaderValue::from_str(c).ok())
        {
            headers.insert(header::WWW_AUTHENTICATE, challenge);
        }
        headers
    }
}
