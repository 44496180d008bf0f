//! Problem rendering configuration.

use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_DOCS_PATH: &str = "/problems/{code}/";

/// Settings for classification and `type` resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProblemConfig {
    /// Path template for documentation links; `{code}` is replaced by the problem code.
    pub docs_path: String,
    /// Whether unclassified errors show their message to clients.
    pub expose_unclassified_detail: bool,
    /// Base URL for `type` links. Derived from the request when unset.
    pub public_base_url: Option<Url>,
    /// `WWW-Authenticate` challenge offered with 401 responses. Without it,
    /// authentication problems are answered with 403.
    pub authenticate_challenge: Option<String>,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        Self {
            docs_path: DEFAULT_DOCS_PATH.to_owned(),
            expose_unclassified_detail: true,
            public_base_url: None,
            authenticate_challenge: None,
        }
    }
}
