//! Preview Handlers - 创建、代理、过期

use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::application::{
    ApplicationError, CreatePreviewCommand, ExpirePreviewCommand, PreviewSettings,
    ServePreviewFileQuery,
};
use crate::infrastructure::http::dto::{
    CreatePreviewRequest, CreatePreviewResponseDto, ExpirePreviewResponseDto,
};
use crate::infrastructure::http::error::{code, ApiError, PreviewPageError};
use crate::infrastructure::http::state::AppState;

/// 会话路由段不以会话前缀开头时，按普通未知路由处理
fn plain_not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

// ============================================================================
// Create
// ============================================================================

/// POST /preview
pub async fn create_preview(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreatePreviewRequest>, JsonRejection>,
) -> Result<Json<CreatePreviewResponseDto>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(code::INVALID_BODY, e.body_text()))?;

    let s3_path = req.s3_path.unwrap_or_default();
    if s3_path.trim().is_empty() {
        return Err(ApiError::BadRequest(
            code::VALIDATION_ERROR,
            "s3Path is required (e.g. class-id-00000006/index.html)".to_string(),
        ));
    }

    let cmd = CreatePreviewCommand {
        s3_path,
        file_name: req.file_name,
    };
    let result = state.create_preview_handler.handle(cmd).await?;

    Ok(Json(result.into()))
}

// ============================================================================
// Serve
// ============================================================================

async fn serve(state: &AppState, session_id: String, sub_path: Option<String>) -> Response {
    if !state.settings.owns_session_route(&session_id) {
        return plain_not_found();
    }

    let query = ServePreviewFileQuery {
        session_id,
        sub_path,
    };

    match state.serve_preview_handler.handle(query).await {
        Ok(file) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, file.content_type),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
            file.body,
        )
            .into_response(),
        Err(e) => PreviewPageError(e).into_response(),
    }
}

/// GET /{sessionId}
pub async fn serve_preview_entry(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Response {
    serve(&state, session_id, None).await
}

/// GET /{sessionId}/{*subPath}
pub async fn serve_preview_file(
    State(state): State<Arc<AppState>>,
    Path((session_id, sub_path)): Path<(String, String)>,
) -> Response {
    serve(&state, session_id, Some(sub_path)).await
}

/// 从 `/{sessionId}/` 形式的路径中取出会话 ID（通配路由不匹配空尾段）
fn trailing_slash_session(settings: &PreviewSettings, path: &str) -> Option<String> {
    let id = path
        .strip_prefix(settings.route_prefix().as_str())?
        .strip_prefix('/')?
        .strip_suffix('/')?;
    if id.is_empty() || id.contains('/') || !settings.owns_session_route(id) {
        return None;
    }
    Some(id.to_string())
}

/// 未匹配路由的兜底处理
pub async fn fallback(
    State(state): State<Arc<AppState>>,
    method: Method,
    OriginalUri(uri): OriginalUri,
) -> Response {
    if method == Method::GET {
        if let Some(session_id) = trailing_slash_session(&state.settings, uri.path()) {
            return serve(&state, session_id, None).await;
        }
    }
    plain_not_found()
}

// ============================================================================
// Expire
// ============================================================================

/// POST /{sessionId}/expire
///
/// 与文件代理共用通配路由，尾段不是 `expire` 时返回 404
pub async fn expire_preview(
    State(state): State<Arc<AppState>>,
    Path((session_id, action)): Path<(String, String)>,
) -> Result<Json<ExpirePreviewResponseDto>, ApiError> {
    if action != "expire" {
        return Err(ApiError::NotFound(code::NOT_FOUND, "Not Found".to_string()));
    }

    let result = state
        .expire_preview_handler
        .handle(ExpirePreviewCommand { session_id })
        .map_err(|e| match e {
            ApplicationError::SessionNotFound(_) => {
                ApiError::NotFound(code::NOT_FOUND, "Not Found".to_string())
            }
            other => other.into(),
        })?;

    let message = if result.expired {
        "Preview session expired"
    } else {
        "Session not found"
    };

    Ok(Json(ExpirePreviewResponseDto {
        success: result.expired,
        message: message.to_string(),
    }))
}
