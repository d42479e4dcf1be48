mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use common::setup;
use lireddit::routes;
use serde_json::{json, Value};
use tower::ServiceExt;

fn graphql_request(query: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(json!({ "query": query }).to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let test_app = setup();
    let app = routes::app(test_app.state.clone());
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_playground_is_served_on_get() {
    let test_app = setup();
    let app = routes::app(test_app.state.clone());
    let response = app
        .oneshot(Request::get("/graphql").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("GraphQL Playground"));
}

#[tokio::test]
async fn test_session_cookie_round_trip() {
    let test_app = setup();
    let app = routes::app(test_app.state.clone());

    let response = app
        .clone()
        .oneshot(graphql_request(
            r#"mutation { register(options: { username: "dave", email: "dave@example.com", password: "secret" }) { user { id } } }"#,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    assert!(cookie.starts_with("qid="));

    // The cookie identifies the viewer on later requests
    let response = app
        .clone()
        .oneshot(graphql_request("{ me { username } }", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["data"]["me"]["username"], "dave");

    let response = app
        .clone()
        .oneshot(graphql_request("mutation { logout }", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["data"]["logout"], true);

    // The session row is gone, so the old cookie is anonymous now
    let response = app
        .oneshot(graphql_request("{ me { username } }", Some(&cookie)))
        .await
        .unwrap();
    assert!(json_body(response).await["data"]["me"].is_null());
}

#[tokio::test]
async fn test_unauthorized_vote_over_http_carries_error_code() {
    let test_app = setup();
    let app = routes::app(test_app.state.clone());
    let response = app
        .oneshot(graphql_request("mutation { vote(postId: 1, value: 1) }", None))
        .await
        .unwrap();
    // GraphQL errors travel in a 200 body
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["extensions"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_cookie_is_anonymous() {
    let test_app = setup();
    let app = routes::app(test_app.state.clone());
    let response = app
        .oneshot(graphql_request("{ me { id } }", Some("qid=not-a-session")))
        .await
        .unwrap();
    assert!(json_body(response).await["data"]["me"].is_null());
}
