//! Classification and body building wired together per request.

use std::sync::Arc;

use http::{HeaderValue, StatusCode};

use crate::catalog::ProblemCatalog;
use crate::classify::{Classifier, NormalizedError};
use crate::config::ProblemConfig;
use crate::error::RaisedError;
use crate::problem::{BuildError, ProblemResponse, RequestContext, build, build_untyped};
use crate::resolver::{CatalogResolver, TypeResolver};

/// Turns raised errors into problem responses.
///
/// Immutable once built; share it between requests behind an `Arc`.
#[derive(Clone)]
pub struct ProblemHandler {
    classifier: Classifier,
    resolver: Arc<dyn TypeResolver>,
}

impl std::fmt::Debug for ProblemHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProblemHandler")
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

impl ProblemHandler {
    #[must_use]
    pub fn new(classifier: Classifier, resolver: Arc<dyn TypeResolver>) -> Self {
        Self {
            classifier,
            resolver,
        }
    }

    /// Handler resolving `type` links through `catalog`.
    #[must_use]
    pub fn from_config(catalog: Arc<ProblemCatalog>, config: &ProblemConfig) -> Self {
        Self::new(
            Classifier::new(config),
            Arc::new(CatalogResolver::new(catalog, config)),
        )
    }

    /// # Errors
    /// Propagates [`BuildError`] from the body builder.
    pub fn handle(
        &self,
        error: &RaisedError,
        ctx: &RequestContext,
    ) -> Result<ProblemResponse, BuildError> {
        let mut normalized = self.classifier.classify(error);
        let www_authenticate =
            apply_challenge(&mut normalized, ctx.authenticate_challenge.as_deref());
        let body = build(&normalized, ctx, self.resolver.as_ref())?;

        Ok(ProblemResponse {
            body,
            www_authenticate,
        })
    }

    /// Like [`handle`](Self::handle), but answers build failures with the
    /// fixed internal-error problem instead of retrying.
    pub fn handle_or_fallback(&self, error: &RaisedError, ctx: &RequestContext) -> ProblemResponse {
        self.handle(error, ctx).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to build problem response");
            ProblemResponse::internal_fallback()
        })
    }

    /// Answers a request whose base URL is unknown: the classified status,
    /// title and payload are kept and `type` is `about:blank`.
    pub fn handle_untyped(
        &self,
        error: &RaisedError,
        authenticate_challenge: Option<&str>,
    ) -> ProblemResponse {
        let mut normalized = self.classifier.classify(error);
        let www_authenticate = apply_challenge(&mut normalized, authenticate_challenge);
        match build_untyped(&normalized) {
            Ok(body) => ProblemResponse {
                body,
                www_authenticate,
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to build problem response");
                ProblemResponse::internal_fallback()
            }
        }
    }
}

/// Authentication problems are 401 only when a challenge can be sent,
/// otherwise they are downgraded to 403.
fn apply_challenge(
    normalized: &mut NormalizedError,
    challenge: Option<&str>,
) -> Option<String> {
    if !normalized.kind.is_authentication() {
        return None;
    }
    let challenge = challenge.filter(|c| {
        let valid = HeaderValue::from_str(c).is_ok();
        if !valid {
            tracing::warn!(challenge = %c, "Ignoring invalid WWW-Authenticate challenge");
        }
        valid
    });
    if let Some(challenge) = challenge {
        normalized.status = StatusCode::UNAUTHORIZED;
        Some(challenge.to_owned())
    } else {
        normalized.status = StatusCode::FORBIDDEN;
        None
    }
}
