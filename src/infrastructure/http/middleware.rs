//! HTTP Middleware
//!
//! 按状态码分级的访问日志

use std::time::Instant;

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};

/// 失败请求日志中间件
///
/// 5xx 记为 error，4xx 记为 warn。
/// 410 是会话过期后的正常访问，只记 info。
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    // 不记录 query，会话内页面可能带有用户参数
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(%method, %path, status = status.as_u16(), elapsed_ms, "Request failed");
    } else if status == StatusCode::GONE {
        tracing::info!(%method, %path, elapsed_ms, "Request hit an expired preview session");
    } else if status.is_client_error() {
        tracing::warn!(%method, %path, status = status.as_u16(), elapsed_ms, "Request rejected");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, routing::get, Router};
    use tower::util::ServiceExt;

    fn router() -> Router {
        Router::new()
            .route("/page", get(|| async { "<p>ok</p>" }))
            .route("/gone", get(|| async { StatusCode::GONE }))
            .route("/broken", get(|| async { StatusCode::BAD_GATEWAY }))
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    async fn status_of(uri: &str) -> StatusCode {
        let request = HttpRequest::builder().uri(uri).body(Body::empty()).unwrap();
        router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_status_passes_through() {
        assert_eq!(status_of("/page?x=1").await, StatusCode::OK);
        assert_eq!(status_of("/gone").await, StatusCode::GONE);
        assert_eq!(status_of("/broken").await, StatusCode::BAD_GATEWAY);
        assert_eq!(status_of("/unknown").await, StatusCode::NOT_FOUND);
    }
}
