//! Health Handler

use axum::Json;

use crate::infrastructure::http::dto::HealthResponse;

/// 存活探针，不检查下游依赖
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
