//! Error classification
//!
//! Turns whatever a handler raised into a [`NormalizedError`]. Classification is
//! infallible; only unclassified errors are logged.

use http::StatusCode;

use crate::catalog::{NOT_AUTHENTICATED, NOT_FOUND, PERMISSION_DENIED, ProblemKind, SERVER_ERROR};
use crate::config::ProblemConfig;
use crate::detail::Detail;
use crate::error::RaisedError;

/// Classified error, ready for the body builder.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedError {
    pub kind: &'static ProblemKind,
    pub status: StatusCode,
    pub title: String,
    /// Effective code: used for the `type` reference and inherited by leaves.
    pub code: String,
    pub detail: Detail,
}

impl NormalizedError {
    /// Normalized form of a platform signal or other kind without overrides.
    #[must_use]
    pub fn from_kind(kind: &'static ProblemKind) -> Self {
        Self {
            kind,
            status: kind.status_code(),
            title: kind.title.to_owned(),
            code: kind.code.to_owned(),
            detail: Detail::from(kind.default_detail),
        }
    }
}

/// Classifier with the unclassified-error exposure policy applied.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    expose_unclassified_detail: bool,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            expose_unclassified_detail: true,
        }
    }
}

impl Classifier {
    #[must_use]
    pub fn new(config: &ProblemConfig) -> Self {
        Self {
            expose_unclassified_detail: config.expose_unclassified_detail,
        }
    }

    #[must_use]
    pub fn classify(&self, error: &RaisedError) -> NormalizedError {
        match error {
            RaisedError::NotFound => NormalizedError::from_kind(&NOT_FOUND),
            RaisedError::PermissionDenied => NormalizedError::from_kind(&PERMISSION_DENIED),
            RaisedError::NotAuthenticated => NormalizedError::from_kind(&NOT_AUTHENTICATED),
            RaisedError::Declared(api) => NormalizedError {
                kind: api.kind(),
                status: api.status(),
                title: api.title().to_owned(),
                code: api.code().to_owned(),
                detail: api.detail().clone(),
            },
            RaisedError::Unclassified(err) => {
                tracing::error!(error = ?err, "Unhandled error while serving request");
                let mut normalized = NormalizedError::from_kind(&SERVER_ERROR);
                if self.expose_unclassified_detail {
                    normalized.detail = Detail::Message(err.to_string());
                }
                normalized
            }
        }
    }
}

/// Classifies with the default policy (unclassified messages are exposed).
#[must_use]
pub fn classify(error: &RaisedError) -> NormalizedError {
    Classifier::default().classify(error)
}
