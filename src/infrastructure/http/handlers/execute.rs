//! Execute Handler - 代码执行（SSE 输出）

use axum::{
    extract::{rejection::JsonRejection, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::stream::{self, Stream};
use std::sync::Arc;

use crate::application::ExecuteCodeCommand;
use crate::infrastructure::http::dto::ExecuteCodeRequest;
use crate::infrastructure::http::error::{code, ApiError};
use crate::infrastructure::http::state::AppState;

/// POST /execute
///
/// 每个 ExecutionEvent 作为一条 `data:` JSON 发送，`close` 之后流结束
pub async fn execute_code(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExecuteCodeRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let handler = state.execute_code_handler.as_ref().ok_or_else(|| {
        ApiError::NotFound(code::EXECUTOR_DISABLED, "Code execution is disabled".to_string())
    })?;

    let Json(req) = payload.map_err(|e| ApiError::BadRequest(code::INVALID_BODY, e.body_text()))?;
    let cmd = ExecuteCodeCommand {
        code: req.code.unwrap_or_default(),
        language: req.language,
    };

    let rx = handler.handle(cmd).await?;

    let events = stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((Event::default().json_data(&event), rx))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
