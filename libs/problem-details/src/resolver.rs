//! Resolution of problem codes into absolute `type` URLs.

use std::sync::Arc;

use url::Url;

use crate::catalog::ProblemCatalog;
use crate::config::ProblemConfig;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("problem type '{code}' is not registered")]
    UnknownCode { code: String },
    #[error("invalid documentation url for '{code}': {source}")]
    InvalidUrl {
        code: String,
        #[source]
        source: url::ParseError,
    },
}

/// Maps a problem code to the absolute URL documenting it.
pub trait TypeResolver: Send + Sync {
    /// # Errors
    /// Returns [`ResolveError::UnknownCode`] if the code was never registered.
    fn resolve(&self, code: &str, base_url: &Url) -> Result<Url, ResolveError>;
}

impl<F> TypeResolver for F
where
    F: Fn(&str, &Url) -> Result<Url, ResolveError> + Send + Sync,
{
    fn resolve(&self, code: &str, base_url: &Url) -> Result<Url, ResolveError> {
        self(code, base_url)
    }
}

/// Resolver backed by a [`ProblemCatalog`] and a path template.
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    catalog: Arc<ProblemCatalog>,
    docs_path: String,
}

impl CatalogResolver {
    #[must_use]
    pub fn new(catalog: Arc<ProblemCatalog>, config: &ProblemConfig) -> Self {
        Self {
            catalog,
            docs_path: config.docs_path.clone(),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &ProblemCatalog {
        &self.catalog
    }
}

impl TypeResolver for CatalogResolver {
    fn resolve(&self, code: &str, base_url: &Url) -> Result<Url, ResolveError> {
        if !self.catalog.contains(code) {
            return Err(ResolveError::UnknownCode {
                code: code.to_owned(),
            });
        }
        let path = self.docs_path.replace("{code}", code);
        base_url
            .join(&path)
            .map_err(|source| ResolveError::InvalidUrl {
                code: code.to_owned(),
                source,
            })
    }
}
