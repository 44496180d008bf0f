//! Problem Details normalization
//!
//! Converts errors raised while serving API requests into a single
//! `application/problem+json` envelope. It includes:
//! - the problem kind catalog (`ProblemKind`, `ProblemCatalog`)
//! - declared API errors and the raised error taxonomy (`ApiError`, `RaisedError`)
//! - the classifier (`classify`) and body builder (`build`)
//! - `type` reference resolution (`TypeResolver`)
//! - optional axum integration (feature `axum`)
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod catalog;
pub mod classify;
pub mod config;
pub mod detail;
pub mod error;
pub mod handler;
pub mod problem;
pub mod resolver;

#[cfg(feature = "axum")]
pub mod axum_layer;

// Re-export commonly used types
pub use catalog::{CatalogEntry, ProblemCatalog, ProblemKind};
pub use classify::{Classifier, NormalizedError, classify};
pub use config::ProblemConfig;
pub use detail::{Detail, ErrorDetail, ErrorTree, PayloadShape};
pub use error::{ApiError, RaisedError};
pub use handler::ProblemHandler;
pub use problem::{
    APPLICATION_PROBLEM_JSON, BuildError, ProblemBody, ProblemPayload, ProblemResponse,
    RequestContext, build, build_untyped,
};
pub use resolver::{CatalogResolver, ResolveError, TypeResolver};
