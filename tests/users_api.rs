//! HTTP behaviour of the user endpoints.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use graceful_server::config::ServerConfig;
use graceful_server::http::{HttpServer, X_REQUEST_ID};
use graceful_server::lifecycle::startup;
use graceful_server::users::{MemoryStore, StoreError, User, UserStore};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn rename_over_http() {
    let addr: SocketAddr = "127.0.0.1:28394".parse().unwrap();
    let config = common::config_on(addr.port());
    let store = Arc::new(MemoryStore::with_users([User { id: 1, name: "alice".into() }]));
    let token = CancellationToken::new();

    let (supervisor, _control) = startup::build(&config, store.clone(), token.clone());
    let running = tokio::spawn(supervisor.run());
    common::wait_for_listener(addr).await;
    let client = common::client();

    let res = client
        .put(format!("http://{addr}/users/1"))
        .json(&json!({ "name": "bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key(X_REQUEST_ID));
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "state": "success" }));
    assert_eq!(store.find(1).await.unwrap().name, "bob");

    let res = client.get(format!("http://{addr}/users/1")).send().await.unwrap();
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "id": 1, "name": "bob" }));

    let res = client
        .put(format!("http://{addr}/users/99"))
        .json(&json!({ "name": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({ "state": "error", "message": "not found user by id 99" })
    );

    let res = client
        .put(format!("http://{addr}/users/1"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await.unwrap();
    assert_eq!(body["state"], "error");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    assert_eq!(store.find(1).await.unwrap().name, "bob");

    let res = client.get(format!("http://{addr}/users/abc")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await.unwrap()["state"], "error");

    token.cancel();
    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

/// Store whose backend is always down.
struct UnavailableStore;

impl UserStore for UnavailableStore {
    async fn find(&self, id: u64) -> Result<User, StoreError> {
        Err(StoreError::storage(
            "find",
            id,
            io::Error::new(io::ErrorKind::ConnectionRefused, "database error"),
        ))
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        Err(StoreError::storage("update", user.id, io::Error::other("database error")))
    }
}

#[tokio::test]
async fn storage_fault_is_server_error() {
    let router = HttpServer::new(ServerConfig::default(), Arc::new(UnavailableStore)).router();

    let res = router
        .oneshot(
            Request::put("/users/1")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"name":"bob"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["state"], "error");
    assert_eq!(body["message"], "find user error by id 1: database error");
}

/// Store whose lookups never return.
struct HangingStore;

impl UserStore for HangingStore {
    async fn find(&self, _id: u64) -> Result<User, StoreError> {
        std::future::pending().await
    }

    async fn update(&self, _user: &User) -> Result<(), StoreError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn slow_handler_times_out_with_request_timeout() {
    let mut config = ServerConfig::default();
    config.timeouts.write_secs = 1;
    let router = HttpServer::new(config, Arc::new(HangingStore)).router();

    let res = router
        .oneshot(Request::get("/users/1").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
}
