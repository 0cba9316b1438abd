//! Shared harness: the full router over a fresh `MemoryStore`, driven with
//! `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use std::sync::Arc;

use api_adapters::AppState;
use auth_adapters::JwtTokenService;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use domains::{MockPasswordHasher, Role, UserRepo};
use serde_json::{json, Value};
use services::{AppServices, Repositories};
use storage_adapters::MemoryStore;
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &[u8] = b"integration-test-secret-0123456789";
pub const PASSWORD: &str = "correct horse battery";

/// Argon2 is deliberately slow; the HTTP tests only need a reversible
/// stand-in with the same contract.
fn plain_hasher() -> MockPasswordHasher {
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_hash().returning(|pw| Ok(format!("plain${pw}")));
    hasher
        .expect_verify()
        .returning(|pw, hash| Ok(hash == format!("plain${pw}")));
    hasher
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub struct Response {
    pub status: StatusCode,
    pub body: Value,
    pub request_id: Option<String>,
}

impl Response {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let services = AppServices::new(
            Repositories::from_store(store.clone()),
            Arc::new(plain_hasher()),
            Arc::new(JwtTokenService::new(SECRET, chrono::Duration::hours(1))),
        );
        let router = api_adapters::router(AppState::new(services), &["*".to_string()]);
        Self { router, store }
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let request_id = res
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        Response {
            status,
            body,
            request_id,
        }
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        self.send(req).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Response {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response {
        self.call(Method::DELETE, uri, token, None).await
    }

    /// Registers `username` and returns `(token, user_id)`.
    pub async fn register(&self, username: &str) -> (String, Uuid) {
        let res = self
            .post(
                "/api/v1/auth/register",
                None,
                json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "register {username}: {}", res.body);
        let token = res.data()["token"].as_str().unwrap().to_string();
        let id = res.data()["user"]["id"].as_str().unwrap().parse().unwrap();
        (token, id)
    }

    /// Promotes directly in the store; existing tokens pick the role up on
    /// their next request.
    pub async fn make_admin(&self, user_id: Uuid) {
        let mut user = UserRepo::find_by_id(self.store.as_ref(), user_id)
            .await
            .unwrap()
            .unwrap();
        user.role = Role::Admin;
        UserRepo::update(self.store.as_ref(), user).await.unwrap();
    }

    /// Creates a published movie and returns its id.
    pub async fn create_movie(&self, token: &str, body: Value) -> Uuid {
        let mut body = body;
        if body.get("language").is_none() {
            body["language"] = json!("English");
        }
        if body.get("status").is_none() {
            body["status"] = json!("published");
        }
        let res = self.post("/api/v1/movies", Some(token), body).await;
        assert_eq!(res.status, StatusCode::CREATED, "create movie: {}", res.body);
        res.data()["id"].as_str().unwrap().parse().unwrap()
    }
}
