//! Axum integration: the fault boundary that renders problems.
//!
//! Handlers return [`RaisedError`] (or [`ApiError`]); the error travels in the
//! response extensions until [`problem_layer`] has the request context needed
//! to resolve `type` links. The layer also turns the router's bare 404/405
//! responses into problems.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::uri::Authority;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use url::Url;

use crate::config::ProblemConfig;
use crate::error::{ApiError, RaisedError};
use crate::handler::ProblemHandler;
use crate::problem::{ProblemResponse, RequestContext};

/// Error waiting in the response extensions for the boundary.
#[derive(Clone)]
struct PendingProblem(Arc<RaisedError>);

impl IntoResponse for RaisedError {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response
            .extensions_mut()
            .insert(PendingProblem(Arc::new(self)));
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        RaisedError::Declared(self).into_response()
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        let headers = self.headers();
        let mut response = axum::Json(self.body).into_response();
        *response.status_mut() = status;
        for (name, value) in &headers {
            response.headers_mut().insert(name, value.clone());
        }
        response
    }
}

/// State of the problem boundary middleware.
#[derive(Debug, Clone)]
pub struct ProblemState {
    handler: Arc<ProblemHandler>,
    public_base_url: Option<Url>,
    authenticate_challenge: Option<String>,
}

impl ProblemState {
    #[must_use]
    pub fn new(handler: ProblemHandler, config: &ProblemConfig) -> Self {
        Self {
            handler: Arc::new(handler),
            public_base_url: config.public_base_url.clone(),
            authenticate_challenge: config.authenticate_challenge.clone(),
        }
    }

    /// Installs [`problem_layer`] on `router`.
    #[must_use]
    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(from_fn_with_state(self, problem_layer))
    }

    fn request_context(&self, headers: &HeaderMap, uri: &Uri) -> Option<RequestContext> {
        let base_url = match &self.public_base_url {
            Some(url) => url.clone(),
            None => derive_base_url(headers, uri)?,
        };
        Some(RequestContext {
            base_url,
            authenticate_challenge: self.authenticate_challenge.clone(),
        })
    }

    fn finalize(&self, error: &RaisedError, ctx: Option<&RequestContext>) -> Response {
        let Some(ctx) = ctx else {
            tracing::warn!(error = %error, "Cannot derive base URL for problem type");
            return self
                .handler
                .handle_untyped(error, self.authenticate_challenge.as_deref())
                .into_response();
        };
        self.handler.handle_or_fallback(error, ctx).into_response()
    }
}

/// `scheme://host/` of the request, honoring `X-Forwarded-Proto`.
///
/// Only the first (client-facing) entry of a forwarded list counts, and only
/// `http`/`https` are accepted from it.
fn derive_base_url(headers: &HeaderMap, uri: &Uri) -> Option<Url> {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|proto| proto.eq_ignore_ascii_case("http") || proto.eq_ignore_ascii_case("https"))
        .or_else(|| uri.scheme_str())
        .unwrap_or("http")
        .to_ascii_lowercase();
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(Authority::as_str))
        .unwrap_or("localhost");
    Url::parse(&format!("{scheme}://{host}/")).ok()
}

/// Middleware rendering every error response as `application/problem+json`.
pub async fn problem_layer(
    State(state): State<ProblemState>,
    request: Request,
    next: Next,
) -> Response {
    let ctx = state.request_context(request.headers(), request.uri());
    let method = request.method().clone();

    let mut response = next.run(request).await;

    let pending = response.extensions_mut().remove::<PendingProblem>();
    let error = if let Some(PendingProblem(error)) = pending {
        error
    } else if response.headers().contains_key(header::CONTENT_TYPE) {
        // Successful responses and bodies the handler rendered itself.
        return response;
    } else {
        match response.status() {
            StatusCode::NOT_FOUND => Arc::new(RaisedError::NotFound),
            StatusCode::METHOD_NOT_ALLOWED => Arc::new(RaisedError::Declared(
                ApiError::method_not_allowed(method.as_str()),
            )),
            _ => return response,
        }
    };

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut problem = state.finalize(&error, ctx.as_ref());
    if let Some(allow) = allow {
        problem.headers_mut().insert(header::ALLOW, allow);
    }
    problem
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn base_url_from_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "api.example.com:8080".parse().unwrap());
        let uri: Uri = "/users/1".parse().unwrap();
        assert_eq!(
            derive_base_url(&headers, &uri).unwrap().as_str(),
            "http://api.example.com:8080/"
        );
    }

    #[test]
    fn forwarded_proto_is_honored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "api.example.com".parse().unwrap());
        headers.insert("x-forwarded-proto", "https".parse().unwrap());
        let uri: Uri = "/".parse().unwrap();
        assert_eq!(
            derive_base_url(&headers, &uri).unwrap().as_str(),
            "https://api.example.com/"
        );
    }

    #[test]
    fn forwarded_proto_list_uses_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "api.example.com".parse().unwrap());
        headers.insert("x-forwarded-proto", "HTTPS, http".parse().unwrap());
        let uri: Uri = "/".parse().unwrap();
        assert_eq!(
            derive_base_url(&headers, &uri).unwrap().as_str(),
            "https://api.example.com/"
        );
    }

    #[test]
    fn unsupported_forwarded_proto_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "api.example.com".parse().unwrap());
        headers.insert("x-forwarded-proto", "ws".parse().unwrap());
        let uri: Uri = "/".parse().unwrap();
        assert_eq!(
            derive_base_url(&headers, &uri).unwrap().as_str(),
            "http://api.example.com/"
        );
    }

    #[test]
    fn missing_host_defaults_to_localhost() {
        let uri: Uri = "/x".parse().unwrap();
        assert_eq!(
            derive_base_url(&HeaderMap::new(), &uri).unwrap().as_str(),
            "http://localhost/"
        );
    }

    #[test]
    fn raised_error_response_carries_pending_problem() {
        let response = RaisedError::NotFound.into_response();
        assert!(response.extensions().get::<PendingProblem>().is_some());
    }
}
