//! Demo HTTP server rendering all API errors as `application/problem+json`.

pub mod config;
pub mod logging;
pub mod routes;

pub use config::AppConfig;
pub use routes::router;
