use super::*;
use crate::Config;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use std::io::{Cursor, Read};
use tempfile::TempDir;
use tower::ServiceExt;


const BOUNDARY: &str = "konversi-test-boundary";

/// Router over a fresh temp workspace and stats database
struct TestApp {
    state: AppState,
    _dir: TempDir,
}

impl TestApp {
    fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }
}

async fn test_app() -> TestApp {
    test_app_with(|_| {}).await
}

async fn test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.storage.upload_dir = dir.path().join("uploads");
    config.storage.output_dir = dir.path().join("outputs");
    config.storage.database_path = dir.path().join("data").join("stats.db");
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    configure(&mut config);

    let state = AppState::from_config(config).await.unwrap();
    TestApp { state, _dir: dir }
}

/// Multipart POST to /convert with a `file` part and optional extra text fields
fn upload_request(uri: &str, filename: Option<&str>, content: &[u8], fields: &[(&str, &str)]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    let disposition = match filename {
        Some(filename) => format!("form-data; name=\"file\"; filename=\"{filename}\""),
        None => "form-data; name=\"file\"".to_string(),
    };
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("content-length", body.len())
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Poll `/stats` until `total` conversions have been recorded
async fn stats_after(app: &TestApp, total: i64) -> crate::types::StatsSnapshot {
    for _ in 0..500 {
        let response = app.send(empty_request("GET", "/stats")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let stats: crate::types::StatsSnapshot =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        if stats.total_conversions >= total {
            return stats;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("{} conversions were never recorded", total);
}

/// Read one XML part out of an xlsx archive
fn xlsx_part(bytes: &[u8], part: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(part).unwrap();
    let mut xml = String::new();
    file.read_to_string(&mut xml).unwrap();
    xml
}

#[tokio::test]
async fn test_api_server_starts_and_stops() {
    let app = test_app().await;
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(serve(app.state.clone(), async move {
        rx.await.ok();
    }));

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    tx.send(()).unwrap();

    let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_any_origin() {
    let app = test_app_with(|config| {
        config.api.cors_origins = vec!["*".to_string()];
    })
    .await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_cors_origin_list() {
    let app = test_app_with(|config| {
        config.api.cors_origins = vec!["http://localhost:3030".to_string()];
    })
    .await;

    let allowed = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3030")
        .body(Body::empty())
        .unwrap();
    let response = app.send(allowed).await;
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:3030"
    );

    let other = Request::builder()
        .uri("/health")
        .header("Origin", "http://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = app.send(other).await;
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_cors_disabled() {
    let app = test_app_with(|config| {
        config.api.cors_enabled = false;
    })
    .await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3030")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let app = test_app().await;
    let response = app.send(empty_request("GET", "/api-docs/openapi.json")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let app = test_app_with(|config| config.api.swagger_ui = true).await;
    let response = app.send(empty_request("GET", "/api-docs/openapi.json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["info"]["title"], "Konversi Data API");
}
