#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use folio_api::credentials::PasswordHasher;
use folio_api::router::router;
use folio_api::state::{AppState, AppStateInner};
use folio_api::token::TokenService;
use folio_db::Database;
use folio_storage::{StorageError, ThumbnailStore, validate_key};

pub const BOUNDARY: &str = "folio-test-boundary";

/// In-memory thumbnail store with switchable failures.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<HashMap<String, Bytes>>,
    pub puts: AtomicUsize,
    pub deletes: AtomicUsize,
    pub fail_put: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl MemoryStore {
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().unwrap().is_empty()
    }

    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ThumbnailStore for MemoryStore {
    async fn put(&self, key: &str, body: Bytes, _content_type: &str) -> Result<String, StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        validate_key(key)?;
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(StorageError::Config("put disabled".into()));
        }
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(format!("http://thumbs.test/{key}"))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        validate_key(key)?;
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StorageError::Config("delete disabled".into()));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_password_cost(4)
    }

    pub fn with_password_cost(cost: u32) -> Self {
        let store = Arc::new(MemoryStore::default());
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            tokens: TokenService::new("integration-test-secret"),
            passwords: PasswordHasher::new(cost),
            thumbnails: store.clone(),
            cookie_secure: false,
            max_upload_bytes: 1024 * 1024,
        });
        Self {
            router: router(state.clone()),
            state,
            store,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, uri: &str) -> Response<Body> {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        body: Value,
        cookie: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn multipart(&self, uri: &str, body: Vec<u8>) -> Response<Body> {
        let req = Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }

    pub async fn register(&self, username: &str, nickname: &str) {
        let res = self
            .json(
                "POST",
                "/api/register",
                serde_json::json!({
                    "username": username,
                    "password": "hunter22",
                    "nickname": nickname,
                }),
                None,
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    /// Log in and return the `token=...` pair for a Cookie header.
    pub async fn login(&self, username: &str) -> String {
        let res = self
            .json(
                "POST",
                "/api/login",
                serde_json::json!({ "username": username, "password": "hunter22" }),
                None,
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        session_pair(&res).expect("login sets the session cookie")
    }

    /// Create a project through the multipart endpoint and return its id.
    pub async fn create_project(&self, owner: &str, title: &str, thumbnail: Option<&[u8]>) -> i64 {
        let mut form = FormBuilder::new()
            .text("title", title)
            .text("user_id", owner)
            .text("url", "https://example.org")
            .text("description", "demo");
        if let Some(data) = thumbnail {
            form = form.file("thumbnail", "thumb.png", "image/png", data);
        }
        let res = self.multipart("/api/projects", form.finish()).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        body_json(res).await["project"]["id"].as_i64().unwrap()
    }

    pub fn count(&self, table: &str) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        self.state
            .db
            .with_conn(|conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
            .unwrap()
    }
}

/// Builds a `multipart/form-data` body by hand.
pub struct FormBuilder {
    body: Vec<u8>,
}

impl FormBuilder {
    pub fn new() -> Self {
        Self { body: Vec::new() }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

pub async fn body_json(res: Response<Body>) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(res: Response<Body>) -> Bytes {
    res.into_body().collect().await.unwrap().to_bytes()
}

/// The `token=...` pair from a response's Set-Cookie header, if any.
pub fn session_pair(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("token="))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub fn set_cookie(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
