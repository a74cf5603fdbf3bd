#![allow(dead_code)]

use std::{collections::HashMap, path::PathBuf};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use travelog::{config::Config, routes, AppState};

pub const BASE_URL: &str = "http://travelog.test";
pub const JWT_SECRET: &str = "test-secret";

const BOUNDARY: &str = "travelog-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub upload_dir: TempDir,
}

pub struct TestFile<'a> {
    pub field: &'a str,
    pub filename: &'a str,
    pub mimetype: &'a str,
    pub bytes: &'a [u8],
}

impl TestApp {
    pub async fn spawn() -> Self {
        let upload_dir = tempfile::tempdir().unwrap();

        let vars = HashMap::from([
            ("DATABASE_URL".to_string(), "sqlite::memory:".to_string()),
            ("JWT_SECRET".to_string(), JWT_SECRET.to_string()),
            ("PUBLIC_BASE_URL".to_string(), BASE_URL.to_string()),
            (
                "UPLOAD_DIR".to_string(),
                upload_dir.path().display().to_string(),
            ),
        ]);
        let config = Config::from_vars(vars).unwrap();

        let state = AppState::from_config(&config).await.unwrap();
        let router = routes::generate_routes(state.clone(), &config).unwrap();

        Self {
            router,
            state,
            upload_dir,
        }
    }

    pub fn upload_path(&self, filename: &str) -> PathBuf {
        self.upload_dir.path().join(filename)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, body.to_vec())
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let authorization = token.map(|token| format!("Bearer {token}"));
        self.request_with_authorization(method, uri, body, authorization.as_deref())
            .await
    }

    /// Like [`TestApp::request`] but sends `authorization` verbatim.
    pub async fn request_with_authorization(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        authorization: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(authorization) = authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let (status, bytes) = self.send(request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), None).await
    }

    pub async fn delete(&self, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, body, None).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        files: &[TestFile<'_>],
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = builder
            .body(Body::from(multipart_body(fields, files)))
            .unwrap();

        let (status, bytes) = self.send(request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Signs a user up and returns `(id, token)`.
    pub async fn signup(&self, username: &str) -> (i64, String) {
        let (status, body) = self
            .post(
                "/signup",
                json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "password123",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        (
            body["user"]["id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn create_trip(&self, user_id: i64, city: &str, country: &str) -> Value {
        let user_id = user_id.to_string();
        let (status, body) = self
            .post_multipart(
                "/trips",
                &[
                    ("user_id", &user_id),
                    ("city", city),
                    ("country", country),
                    ("start_date", "2024-05-01"),
                    ("end_date", "2024-05-07"),
                ],
                &[],
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    pub async fn follow(&self, follower_id: i64, followed_id: i64) -> (StatusCode, Value) {
        self.post(
            &format!("/users/{follower_id}/follow"),
            json!({ "target_user_id": followed_id }),
        )
        .await
    }
}

pub fn multipart_body(fields: &[(&str, &str)], files: &[TestFile<'_>]) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    for file in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.field, file.filename, file.mimetype
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn ids(values: &Value) -> Vec<i64> {
    values
        .as_array()
        .unwrap()
        .iter()
        .map(|value| value["id"].as_i64().unwrap())
        .collect()
}
