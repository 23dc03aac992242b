//! HTTP Routes
//!
//! API Endpoints:
//! - /health                    GET   存活探针
//! - /preview                   POST  创建预览会话
//! - /execute                   POST  执行代码（SSE）
//! - /{sessionId}               GET   会话入口文件
//! - /{sessionId}/              GET   会话入口文件（兜底路由处理）
//! - /{sessionId}/{*subPath}    GET   会话内文件
//! - /{sessionId}/expire        POST  过期会话（beacon）
//!
//! 配置了 mount_path 时以上路由整体挂载在 `/{mount_path}` 下，`/health` 在根路径额外保留一份。

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;
use crate::domain::preview::trim_slashes;

/// 创建所有路由
pub fn create_routes(mount_path: &str) -> Router<Arc<AppState>> {
    let mount = trim_slashes(mount_path);
    let router = if mount.is_empty() {
        preview_routes()
    } else {
        Router::new()
            .route("/health", get(handlers::health))
            .nest(&format!("/{}", mount), preview_routes())
    };
    router.fallback(handlers::fallback)
}

/// 预览服务路由
fn preview_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/preview", post(handlers::create_preview))
        .route("/execute", post(handlers::execute_code))
        .route("/:session_id", get(handlers::serve_preview_entry))
        .route(
            "/:session_id/*path",
            get(handlers::serve_preview_file).post(handlers::expire_preview),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        CodeRunnerPort, ExecutionEvent, Language, PreviewSettings, RunnerError,
        SessionRegistryPort,
    };
    use crate::domain::BEACON_MARKER;
    use crate::infrastructure::adapters::storage::InMemoryObjectStorage;
    use crate::infrastructure::memory::{InMemorySessionRegistry, RegistryConfig};
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    const SITE: &str = "codingpt/execute/demo/site";

    struct StubRunner;

    #[async_trait]
    impl CodeRunnerPort for StubRunner {
        async fn run(
            &self,
            _language: Language,
            code: String,
        ) -> Result<mpsc::Receiver<ExecutionEvent>, RunnerError> {
            let (tx, rx) = mpsc::channel(4);
            tokio::spawn(async move {
                let _ = tx.send(ExecutionEvent::Output { data: code }).await;
                let _ = tx
                    .send(ExecutionEvent::Close {
                        exit_code: 0,
                        has_error: false,
                        message: None,
                    })
                    .await;
            });
            Ok(rx)
        }
    }

    struct TestApp {
        router: Router,
        storage: Arc<InMemoryObjectStorage>,
        registry: Arc<InMemorySessionRegistry>,
    }

    fn test_app_with(settings: PreviewSettings, runner: Option<Arc<dyn CodeRunnerPort>>) -> TestApp {
        let storage = Arc::new(InMemoryObjectStorage::new());
        let registry = Arc::new(InMemorySessionRegistry::new(RegistryConfig::default()));
        let mount_path = settings.mount_path.clone();
        let state = AppState::new(settings, storage.clone(), registry.clone(), runner);
        TestApp {
            router: create_routes(&mount_path).with_state(Arc::new(state)),
            storage,
            registry,
        }
    }

    fn test_app() -> TestApp {
        let app = test_app_with(PreviewSettings::default(), None);
        app.storage.put(
            &format!("{}/index.html", SITE),
            "<!DOCTYPE html><html><head><link rel=\"stylesheet\" href=\"style.css\"></head><body><h1>Demo</h1></body></html>",
            Some("text/html"),
        );
        app.storage.put(&format!("{}/style.css", SITE), "h1{color:red}", Some("binary/octet-stream"));
        app
    }

    impl TestApp {
        async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn get(&self, uri: &str) -> Response {
            self.send(Request::get(uri).body(Body::empty()).unwrap()).await
        }

        async fn post_json(&self, uri: &str, body: Value) -> Response {
            self.send(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
        }

        async fn post_empty(&self, uri: &str) -> Response {
            self.send(Request::post(uri).body(Body::empty()).unwrap()).await
        }

        async fn create(&self, s3_path: &str) -> Value {
            let response = self.post_json("/preview", json!({ "s3Path": s3_path })).await;
            assert_eq!(response.status(), StatusCode::OK);
            body_json(response).await
        }
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    async fn body_text(response: Response) -> String {
        String::from_utf8(body_bytes(response).await).unwrap()
    }

    fn content_type(response: &Response) -> String {
        response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let response = app.get("/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_create_preview_for_directory_with_index() {
        let app = test_app();
        let json = app.create("demo/site").await;

        let session_id = json["sessionId"].as_str().unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["expiresIn"], 300);
        assert_eq!(json["s3Path"], format!("{}/index.html", SITE));
        assert!(session_id.starts_with("preview-"));
        assert!(json["previewUrl"]
            .as_str()
            .unwrap()
            .ends_with(&format!("/{}/index.html", session_id)));
    }

    #[tokio::test]
    async fn test_create_preview_without_html_is_404() {
        let app = test_app();
        app.storage.put("codingpt/execute/demo/empty/data.json", "{}", None);

        let response = app.post_json("/preview", json!({ "s3Path": "demo/empty" })).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "NoViewableEntry");
    }

    #[tokio::test]
    async fn test_create_preview_rejects_bad_requests() {
        let app = test_app();

        let missing = app.post_json("/preview", json!({})).await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(missing).await["success"], false);

        let ambiguous = app.post_json("/preview", json!({ "s3Path": "codingpt/other" })).await;
        assert_eq!(ambiguous.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(ambiguous).await["error"], "InvalidPath");

        let not_json = app.post_empty("/preview").await;
        assert_eq!(not_json.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_preview_storage_down_is_500() {
        let app = test_app();
        app.storage.set_unavailable(true);

        let response = app.post_json("/preview", json!({ "s3Path": "demo/site" })).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["message"].as_str().unwrap().contains("unavailable"));
    }

    #[tokio::test]
    async fn test_serve_entry_injects_base_and_beacon() {
        let app = test_app();
        let json = app.create("demo/site").await;
        let session_id = json["sessionId"].as_str().unwrap();

        let response = app.get(&format!("/{}/index.html", session_id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), "text/html; charset=utf-8");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

        let html = body_text(response).await;
        assert!(html.contains(&format!(r#"<head><base href="/{}/"><link"#, session_id)));
        assert_eq!(html.matches(BEACON_MARKER).count(), 1);
        assert!(html.contains("<h1>Demo</h1>"));

        let id = crate::domain::preview::SessionId::parse("preview-", session_id).unwrap();
        assert!(app.registry.get(&id).unwrap().is_active);
    }

    #[tokio::test]
    async fn test_serve_entry_without_sub_path() {
        let app = test_app();
        let json = app.create("demo/site").await;
        let session_id = json["sessionId"].as_str().unwrap();

        for uri in [format!("/{}", session_id), format!("/{}/", session_id)] {
            let response = app.get(&uri).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
            assert!(body_text(response).await.contains("<base href="));
        }
    }

    #[tokio::test]
    async fn test_serve_asset_with_extension_content_type() {
        let app = test_app();
        let json = app.create("demo/site").await;
        let session_id = json["sessionId"].as_str().unwrap();

        let response = app.get(&format!("/{}/style.css", session_id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), "text/css; charset=utf-8");
        assert_eq!(body_text(response).await, "h1{color:red}");
    }

    #[tokio::test]
    async fn test_expired_session_is_410() {
        let app = test_app();
        let session = app
            .registry
            .create_at(SITE, "index.html", Utc::now() - Duration::seconds(301));

        let response = app.get(&format!("/{}/index.html", session.id)).await;
        assert_eq!(response.status(), StatusCode::GONE);
        assert!(content_type(&response).starts_with("text/html"));
        assert!(app.registry.get(&session.id).is_none());

        // 已被淘汰，再次访问视为不存在
        let again = app.get(&format!("/{}/index.html", session.id)).await;
        assert_eq!(again.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_asset_returns_diagnostics() {
        let app = test_app();
        let json = app.create("demo/site").await;
        let session_id = json["sessionId"].as_str().unwrap();

        let response = app.get(&format!("/{}/missing.css", session_id)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["requestedFile"], "missing.css");
        assert_eq!(json["resolvedPath"], format!("{}/missing.css", SITE));
    }

    #[tokio::test]
    async fn test_missing_document_renders_page() {
        let app = test_app();
        let json = app.create("demo/site").await;
        let session_id = json["sessionId"].as_str().unwrap();

        let response = app.get(&format!("/{}/about.html", session_id)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(content_type(&response).starts_with("text/html"));
        assert!(body_text(response).await.contains("about.html"));
    }

    #[tokio::test]
    async fn test_second_preview_supersedes_first() {
        let app = test_app();
        let first = app.create("demo/site").await;
        let second = app.create("demo/site").await;
        assert_ne!(first["sessionId"], second["sessionId"]);

        let response = app
            .get(&format!("/{}/index.html", first["sessionId"].as_str().unwrap()))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .get(&format!("/{}/index.html", second["sessionId"].as_str().unwrap()))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_expire_twice() {
        let app = test_app();
        let json = app.create("demo/site").await;
        let uri = format!("/{}/expire", json["sessionId"].as_str().unwrap());

        let first = app.post_empty(&uri).await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(body_json(first).await["success"], true);

        let second = app.post_empty(&uri).await;
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(body_json(second).await["success"], false);

        assert!(app.registry.is_empty());
    }

    #[tokio::test]
    async fn test_foreign_ids_fall_through_as_404() {
        let app = test_app();

        let response = app.get("/admin/index.html").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Not Found");

        let response = app.post_empty("/admin/expire").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Not Found");

        let response = app.post_empty("/preview-1-abc/other").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_session_renders_not_found_page() {
        let app = test_app();
        let response = app.get("/preview-123-deadbeef/index.html").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(content_type(&response).starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_mounted_routes_use_mount_prefix() {
        let settings = PreviewSettings::default().with_mount_path("api/executor");
        let app = test_app_with(settings, None);
        app.storage.put(&format!("{}/index.html", SITE), "<p>hi</p>", None);

        let response = app.post_json("/api/executor/preview", json!({ "s3Path": "demo/site" })).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let session_id = json["sessionId"].as_str().unwrap();
        assert!(json["previewUrl"]
            .as_str()
            .unwrap()
            .contains(&format!("/api/executor/{}/", session_id)));

        let response = app.get(&format!("/api/executor/{}/", session_id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(&format!(r#"<base href="/api/executor/{}/">"#, session_id)));
        assert!(html.contains(&format!("/api/executor/{}/expire", session_id)));

        assert_eq!(app.get("/health").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_execute_disabled() {
        let app = test_app();
        let response = app
            .post_json("/execute", json!({ "code": "console.log(1)" }))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "ExecutorDisabled");
    }

    #[tokio::test]
    async fn test_execute_streams_events() {
        let app = test_app_with(PreviewSettings::default(), Some(Arc::new(StubRunner)));

        let response = app
            .post_json("/execute", json!({ "code": "console.log(1)" }))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(content_type(&response).starts_with("text/event-stream"));

        let body = body_text(response).await;
        assert!(body.contains(r#"data: {"type":"output","data":"console.log(1)"}"#));
        assert!(body.contains(r#"data: {"type":"close","exitCode":0,"hasError":false}"#));

        let invalid = app.post_json("/execute", json!({ "code": "x", "language": "ruby" })).await;
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }
}
