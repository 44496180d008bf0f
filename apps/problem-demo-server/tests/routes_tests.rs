#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Demo API answered through the problem boundary.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use problem_details::{APPLICATION_PROBLEM_JSON, ProblemConfig};
use problem_demo_server::router;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    router(&ProblemConfig::default())
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, String, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_owned();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, content_type, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, "testserver")
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::HOST, "testserver")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn existing_user_is_returned() {
    let (status, content_type, body) = call(app(), get("/api/v1/users/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/json");
    assert_eq!(body["name"], json!("Ada"));
}

#[tokio::test]
async fn missing_user_is_not_found_problem() {
    for uri in ["/api/v1/users/42", "/api/v1/users/abc"] {
        let (status, content_type, body) = call(app(), get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(content_type, APPLICATION_PROBLEM_JSON);
        assert_eq!(
            body,
            json!({
                "status": 404,
                "title": "Not Found",
                "type": "http://testserver/problems/not_found/",
                "detail": {"string": "Not found.", "code": "not_found"}
            })
        );
    }
}

#[tokio::test]
async fn validation_errors_keep_field_structure() {
    let (status, _, body) = call(
        app(),
        post_json(
            "/api/v1/users",
            &json!({"email": "nope", "address": {"zip": "12a"}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "status": 400,
            "title": "Invalid input.",
            "type": "http://testserver/problems/invalid/",
            "name": [{"string": "This field is required.", "code": "invalid"}],
            "email": [{"string": "Enter a valid email address.", "code": "invalid"}],
            "address": {
                "city": {"string": "This field is required.", "code": "invalid"},
                "zip": [
                    {"string": "Ensure this field has at least 5 characters.", "code": "invalid"},
                    {"string": "Enter a number.", "code": "invalid"}
                ]
            }
        })
    );
}

#[tokio::test]
async fn custom_code_resolves_to_its_own_type() {
    let (status, _, body) = call(
        app(),
        post_json(
            "/api/v1/users",
            &json!({"name": "Root", "email": "admin@example.com"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], json!("http://testserver/problems/email_taken/"));
    assert_eq!(
        body["email"],
        json!([{"string": "This email is already registered.", "code": "email_taken"}])
    );
}

#[tokio::test]
async fn valid_user_is_created() {
    let (status, _, body) = call(
        app(),
        post_json(
            "/api/v1/users",
            &json!({"name": "Grace", "email": "grace@example.com", "address": {"city": "Arlington", "zip": "22201"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(2));
}

#[tokio::test]
async fn malformed_json_is_parse_error() {
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/users")
        .header(header::HOST, "testserver")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, content_type, body) = call(app(), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type, APPLICATION_PROBLEM_JSON);
    assert_eq!(body["title"], json!("Malformed request."));
    assert_eq!(body["detail"]["code"], json!("parse_error"));
}

#[tokio::test]
async fn wrong_media_type_is_rejected() {
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/users")
        .header(header::HOST, "testserver")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let (status, _, body) = call(app(), req).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        body["detail"]["string"],
        json!("Unsupported media type \"text/plain\" in request.")
    );
}

#[tokio::test]
async fn admin_is_permission_denied() {
    let (status, _, body) = call(app(), get("/api/v1/admin")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["type"], json!("http://testserver/problems/permission_denied/"));
}

#[tokio::test]
async fn me_requires_credentials() {
    let (status, _, body) = call(app(), get("/api/v1/me")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"]["code"], json!("not_authenticated"));
}

#[tokio::test]
async fn version_checks() {
    let req = |version: &str| {
        Request::builder()
            .uri("/api/v1/versioned")
            .header(header::HOST, "testserver")
            .header("x-api-version", version)
            .body(Body::empty())
            .unwrap()
    };

    let (status, _, body) = call(app(), req("banana")).await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(
        body["detail"]["string"],
        json!("Provided version \"banana\" is invalid.")
    );

    let (status, _, body) = call(app(), req("1.0")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"]["code"], json!("deprecated_version"));

    let (status, _, body) = call(app(), req("2.0")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], json!("2.0"));
}

#[tokio::test]
async fn unexpected_failure_is_masked() {
    let (status, _, body) = call(app(), get("/api/v1/boom")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["title"], json!("A server error occurred."));
    assert_eq!(body["type"], json!("http://testserver/problems/error/"));
    assert_eq!(body["detail"]["string"], json!("failed to load demo seed"));
}

#[tokio::test]
async fn problem_type_documentation_is_served() {
    let (status, content_type, body) = call(app(), get("/problems/invalid_version/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/json");
    assert_eq!(
        body["description"],
        json!("Malformed or unsupported version string is provided with the request.")
    );

    let (status, _, _) = call(app(), get("/problems/made_up/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
