//! HTTP Server
//!
//! 组装路由与中间件，监听端口直到收到关闭信号

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use http::header::CONTENT_TYPE;
use http::Method;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;

/// 监听与请求体限制
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 请求体大小上限（字节）
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("0.0.0.0", 5200)
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }

    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 预览页面由浏览器直接打开，beacon 与 /execute 都可能跨域
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}

pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 带全部中间件的完整路由
    pub fn router(&self) -> Router {
        create_routes(&self.state.settings.mount_path)
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(axum::middleware::from_fn(error_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer())
            .with_state(self.state.clone())
    }

    /// 监听端口，`shutdown` 完成后停止接收新连接并等待在途请求结束
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let listener = TcpListener::bind(self.config.addr()).await?;

        tracing::info!(
            addr = %listener.local_addr()?,
            mount_path = %self.state.settings.route_prefix(),
            sessions = self.state.registry.len(),
            "HTTP server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::PreviewSettings;
    use crate::infrastructure::adapters::InMemoryObjectStorage;
    use crate::infrastructure::memory::InMemorySessionRegistry;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use tower::util::ServiceExt;

    fn server(max_body_bytes: usize) -> HttpServer {
        let state = AppState::new(
            PreviewSettings::default(),
            Arc::new(InMemoryObjectStorage::new()),
            Arc::new(InMemorySessionRegistry::default()),
            None,
        );
        HttpServer::new(ServerConfig::default().with_max_body_bytes(max_body_bytes), state)
    }

    #[tokio::test]
    async fn test_router_serves_health_with_cors() {
        let request = Request::builder()
            .uri("/health")
            .header("origin", "https://app.example.com")
            .body(Body::empty())
            .unwrap();
        let response = server(1024).router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_body_limit_applies() {
        let body = format!(r#"{{"s3Path":"{}"}}"#, "a".repeat(4096));
        let request = Request::builder()
            .method("POST")
            .uri("/preview")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let server = server(1024);
        let response = server.router().oneshot(request).await.unwrap();

        // 超限请求体在进入 handler 之前被拒绝
        assert!(response.status().is_client_error());
        assert!(server.state.registry.is_empty());
    }
}
