//! HTTP transport tests driving the router in-process.

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request as HttpRequest, StatusCode};
use axum::Router;
use graphql_demos::server::{router, AppState};
use graphql_demos::{App, SchemaVariant};
use serde_json::{json, Value};
use tower::ServiceExt;

const BODY_BYTES_MAX: usize = 1024 * 1024;

async fn app(variant: SchemaVariant) -> Router {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();

    let app = App::in_memory(variant, true).await.unwrap();
    router(AppState::new(app, Duration::from_secs(5)))
}

async fn send(router: Router, request: HttpRequest<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), BODY_BYTES_MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post(body: Value) -> HttpRequest<Body> {
    HttpRequest::post("/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> HttpRequest<Body> {
    HttpRequest::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_post_query() {
    let router = app(SchemaVariant::Basics).await;

    let (status, body) = send(
        router,
        post(json!({"query": "{ users(query: \"kratos\") { name email } }"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"data": {"users": [{"name": "Kratos", "email": "Kratos@email.com"}]}})
    );
}

#[tokio::test]
async fn test_post_with_variables_and_operation_name() {
    let router = app(SchemaVariant::Basics).await;

    let (status, body) = send(
        router,
        post(json!({
            "query": "query A { me { id } } query B($q: String) { posts(query: $q) { id } }",
            "variables": {"q": "iphone"},
            "operationName": "B"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": {"posts": [{"id": "2"}]}}));
}

#[tokio::test]
async fn test_field_errors_keep_status_ok() {
    let router = app(SchemaVariant::Basics).await;

    let (status, body) = send(
        router,
        post(json!({
            "query": "mutation { createPost(title: \"T\", body: \"B\", published: true, author: \"ghost\") { id } }"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"createPost": null}));
    assert_eq!(body["errors"][0]["message"], "user does not exist");
    assert_eq!(body["errors"][0]["path"], json!(["createPost"]));
    assert_eq!(body["errors"][0]["extensions"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["errors"][0]["locations"][0]["line"], 1);
}

#[tokio::test]
async fn test_document_errors_have_no_data() {
    let router = app(SchemaVariant::Basics).await;

    let (status, body) = send(router, post(json!({"query": "{ users { nope } }"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("data").is_none());
    assert_eq!(
        body["errors"][0]["extensions"]["code"],
        "GRAPHQL_VALIDATION_FAILED"
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let router = app(SchemaVariant::Basics).await;

    let request = HttpRequest::post("/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["extensions"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_get_query() {
    let router = app(SchemaVariant::Nexus).await;

    let (status, body) = send(
        router,
        get("/graphql?query=%7B%20postById(id%3A%201)%20%7B%20title%20%7D%20%7D"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"data": {"postById": {"title": "Macbook Pro 2020 SoC M1"}}})
    );
}

#[tokio::test]
async fn test_get_with_variables() {
    let router = app(SchemaVariant::Nexus).await;

    // query($id: Int) { postById(id: $id) { id } }  with  {"id": 3}
    let uri = "/graphql?query=query(%24id%3A%20Int)%20%7B%20postById(id%3A%20%24id)%20%7B%20id%20%7D%20%7D\
               &variables=%7B%22id%22%3A3%7D";
    let (status, body) = send(router, get(uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": {"postById": {"id": 3}}}));
}

#[tokio::test]
async fn test_get_rejects_mutations() {
    let router = app(SchemaVariant::Nexus).await;

    let (status, body) = send(
        router,
        get("/graphql?query=mutation%20%7B%20deletePost(id%3A%203)%20%7B%20id%20%7D%20%7D"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["extensions"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_get_without_query_is_bad_request() {
    let router = app(SchemaVariant::Basics).await;

    let (status, body) = send(router, get("/graphql")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["extensions"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_schema_endpoint_per_variant() {
    let router = app(SchemaVariant::Nexus).await;

    let response = router.oneshot(get("/schema")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), BODY_BYTES_MAX).await.unwrap();
    let sdl = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(sdl.contains("input UserCreateInput {"));
    assert!(sdl.contains("  posts: [PostCreateInput!]"));
    assert!(sdl.contains("  signupUser(data: UserCreateInput!): User!"));
}
