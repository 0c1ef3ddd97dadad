use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{CACHE_CONTROL, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response, StatusCode};
use crumb_server::{ServerConfig, app};
use serde_json::{Value, json};
use tower::ServiceExt as _;

fn router() -> Router {
    app(&ServerConfig::default())
}

fn request(method: Method, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// The `name=value` part of the only `Set-Cookie` header.
fn cookie_pair(response: &Response<Body>) -> String {
    let headers: Vec<_> = response.headers().get_all(SET_COOKIE).iter().collect();
    assert_eq!(headers.len(), 1);
    let header = headers[0].to_str().unwrap();
    header.split(';').next().unwrap().to_owned()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_not_cached() {
    let response = router().oneshot(request(Method::GET, "/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(CACHE_CONTROL).is_some());
    assert!(response.headers().get(SET_COOKIE).is_none());
    assert_eq!(body_json(response).await["status"], "up");
}

#[tokio::test]
async fn visits_count_up_across_requests() {
    let app = router();

    let first = app.clone().oneshot(request(Method::GET, "/visits", None)).await.unwrap();
    let pair = cookie_pair(&first);
    assert!(pair.starts_with("visits="));
    assert_eq!(body_json(first).await, json!({"count": 1}));

    let second = app.oneshot(request(Method::GET, "/visits", Some(&pair))).await.unwrap();
    assert_eq!(body_json(second).await, json!({"count": 2}));
}

#[tokio::test]
async fn session_round_trip() {
    let app = router();

    let login = app.clone().oneshot(request(Method::POST, "/session/alice", None)).await.unwrap();
    assert_eq!(login.status(), StatusCode::OK);
    let header = login.headers().get(SET_COOKIE).unwrap().to_str().unwrap().to_owned();
    assert!(header.contains("SameSite=Lax"));
    assert!(!header.contains("Expires"));
    let pair = cookie_pair(&login);
    assert!(pair.starts_with("session=s"));
    assert!(!pair.contains("alice"));

    let whoami = app.oneshot(request(Method::GET, "/session", Some(&pair))).await.unwrap();
    assert_eq!(whoami.status(), StatusCode::OK);
    assert_eq!(body_json(whoami).await, json!({"user": "alice"}));
}

#[tokio::test]
async fn missing_session_is_unauthorized() {
    let response = router().oneshot(request(Method::GET, "/session", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn forged_session_is_rejected() {
    let response = router()
        .oneshot(request(Method::GET, "/session", Some("session=s%3Anot-a-ciphertext")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_deletes_the_session() {
    let response = router().oneshot(request(Method::POST, "/logout", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let pair = cookie_pair(&response);
    assert_eq!(pair, "session=deleted");
}
