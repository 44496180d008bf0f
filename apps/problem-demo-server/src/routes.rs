//! Demo API exercising every problem kind, plus the problem type documentation endpoint.
#![allow(clippy::unused_async)]

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, header};
use axum::routing::get;
use axum::{Json, Router};
use problem_details::axum_layer::ProblemState;
use problem_details::{
    ApiError, CatalogEntry, ProblemCatalog, ProblemConfig, ProblemHandler, RaisedError,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const API_VERSION_HEADER: &str = "x-api-version";
pub const MIN_API_VERSION: (u32, u32) = (1, 1);

const REQUIRED: &str = "This field is required.";

#[derive(Clone)]
struct AppState {
    catalog: Arc<ProblemCatalog>,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewUserReq {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<AddressReq>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddressReq {
    pub city: Option<String>,
    pub zip: Option<String>,
}

/// Catalog with the built-in kinds and the codes this API sets itself.
#[must_use]
pub fn demo_catalog() -> ProblemCatalog {
    let mut catalog = ProblemCatalog::with_builtins();
    catalog.register_code(
        "email_taken",
        "Email already registered.",
        "Another account already uses this email address.",
    );
    catalog
}

/// Full application router with the problem boundary installed.
#[must_use]
pub fn router(config: &ProblemConfig) -> Router {
    let catalog = Arc::new(demo_catalog());
    let handler = ProblemHandler::from_config(Arc::clone(&catalog), config);

    let api = Router::new()
        .route("/api/v1/users", get(list_users).post(create_user))
        .route("/api/v1/users/{id}", get(get_user))
        .route("/api/v1/admin", get(admin))
        .route("/api/v1/me", get(me))
        .route("/api/v1/versioned", get(versioned))
        .route("/api/v1/boom", get(boom))
        .route("/problems/{code}/", get(problem_type_doc))
        .with_state(AppState { catalog });

    ProblemState::new(handler, config).apply(api)
}

async fn list_users() -> Json<Vec<UserDto>> {
    Json(vec![demo_user()])
}

async fn get_user(id: Result<Path<u64>, PathRejection>) -> Result<Json<UserDto>, RaisedError> {
    // Non-numeric ids cannot exist.
    let Ok(Path(id)) = id else {
        return Err(RaisedError::NotFound);
    };
    if id == 1 {
        Ok(Json(demo_user()))
    } else {
        Err(RaisedError::NotFound)
    }
}

async fn create_user(
    headers: HeaderMap,
    payload: Result<Json<NewUserReq>, JsonRejection>,
) -> Result<Json<UserDto>, ApiError> {
    let Json(req) = payload.map_err(|rejection| rejection_to_problem(&headers, &rejection))?;

    let mut errors = Map::new();
    match req.name.as_deref().map(str::trim) {
        None | Some("") => {
            errors.insert("name".to_owned(), json!([REQUIRED]));
        }
        Some(_) => {}
    }
    match req.email.as_deref() {
        None => {
            errors.insert("email".to_owned(), json!([REQUIRED]));
        }
        Some(email) if !email.contains('@') => {
            errors.insert("email".to_owned(), json!(["Enter a valid email address."]));
        }
        Some("admin@example.com") => {
            return Err(
                ApiError::validation(json!({"email": ["This email is already registered."]}))
                    .with_code("email_taken"),
            );
        }
        Some(_) => {}
    }
    if let Some(address) = &req.address {
        let address_errors = validate_address(address);
        if !address_errors.is_empty() {
            errors.insert("address".to_owned(), Value::Object(address_errors));
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::validation(Value::Object(errors)));
    }

    Ok(Json(UserDto {
        id: 2,
        name: req.name.unwrap_or_default(),
        email: req.email.unwrap_or_default(),
    }))
}

fn validate_address(address: &AddressReq) -> Map<String, Value> {
    let mut errors = Map::new();
    if address.city.as_deref().is_none_or(str::is_empty) {
        errors.insert("city".to_owned(), json!(REQUIRED));
    }
    if let Some(zip) = &address.zip {
        let mut zip_errors = Vec::new();
        if zip.len() < 5 {
            zip_errors.push("Ensure this field has at least 5 characters.");
        }
        if !zip.chars().all(|c| c.is_ascii_digit()) {
            zip_errors.push("Enter a number.");
        }
        if !zip_errors.is_empty() {
            errors.insert("zip".to_owned(), json!(zip_errors));
        }
    }
    errors
}

fn rejection_to_problem(headers: &HeaderMap, rejection: &JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            let media_type = headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            ApiError::unsupported_media_type(media_type)
        }
        other => ApiError::parse_error().with_detail(other.body_text()),
    }
}

async fn admin() -> Result<Json<Value>, RaisedError> {
    Err(RaisedError::PermissionDenied)
}

async fn me() -> Result<Json<Value>, RaisedError> {
    Err(RaisedError::NotAuthenticated)
}

async fn versioned(headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    let raw = headers
        .get(API_VERSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("1.1");
    let version = parse_version(raw).ok_or_else(|| ApiError::invalid_version(raw))?;
    if version < MIN_API_VERSION {
        let (major, minor) = MIN_API_VERSION;
        return Err(ApiError::deprecated_version(raw, &format!("{major}.{minor}")));
    }
    Ok(Json(json!({"version": raw})))
}

fn parse_version(raw: &str) -> Option<(u32, u32)> {
    let (major, minor) = raw.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

async fn boom() -> Result<Json<Value>, RaisedError> {
    let content = std::fs::read_to_string("/nonexistent/demo-seed.json").map_err(|e| {
        RaisedError::unclassified(anyhow::Error::new(e).context("failed to load demo seed"))
    })?;
    Ok(Json(json!({"seed": content})))
}

async fn problem_type_doc(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<([(header::HeaderName, &'static str); 1], Json<CatalogEntry>), RaisedError> {
    let entry = state
        .catalog
        .get(&code)
        .cloned()
        .ok_or(RaisedError::NotFound)?;
    Ok(([(header::CACHE_CONTROL, "public, max-age=3600")], Json(entry)))
}

fn demo_user() -> UserDto {
    UserDto {
        id: 1,
        name: "Ada".to_owned(),
        email: "ada@example.com".to_owned(),
    }
}
