//! HTTP Error Handling
//!
//! - ApiError: JSON 接口错误，`{success:false, message, error:<code>}`
//! - PreviewPageError: 浏览器直接访问的预览页面错误，返回 HTML

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::pages;
use crate::application::ApplicationError;
use crate::domain::is_html_path;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error,
            requested_file: None,
            resolved_path: None,
        }
    }
}

/// 错误码定义
pub mod code {
    pub const INVALID_BODY: &str = "InvalidBody";
    pub const VALIDATION_ERROR: &str = "ValidationError";
    pub const INVALID_PATH: &str = "InvalidPath";
    pub const NOT_FOUND: &str = "NotFound";
    pub const NO_VIEWABLE_ENTRY: &str = "NoViewableEntry";
    pub const SESSION_NOT_FOUND: &str = "SessionNotFound";
    pub const SESSION_EXPIRED: &str = "SessionExpired";
    pub const FILE_NOT_FOUND: &str = "FileNotFound";
    pub const STORAGE_ERROR: &str = "StorageError";
    pub const EXECUTOR_DISABLED: &str = "ExecutorDisabled";
    pub const INTERNAL_ERROR: &str = "InternalError";
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str, String),
    NotFound(&'static str, String),
    Gone(&'static str, String),
    FileNotFound {
        requested_file: String,
        resolved_path: String,
    },
    Internal(&'static str, String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(..) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(..) | ApiError::FileNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Gone(..) => StatusCode::GONE,
            ApiError::Internal(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let response = match self {
            ApiError::BadRequest(code, msg)
            | ApiError::NotFound(code, msg)
            | ApiError::Gone(code, msg) => {
                tracing::warn!(status = status.as_u16(), code = code, error = %msg, "Request failed");
                ErrorResponse::new(code, msg)
            }
            ApiError::Internal(code, msg) => {
                tracing::error!(status = status.as_u16(), code = code, error = %msg, "Internal server error");
                ErrorResponse::new(code, msg)
            }
            ApiError::FileNotFound {
                requested_file,
                resolved_path,
            } => {
                tracing::warn!(requested_file = %requested_file, resolved_path = %resolved_path, "Preview file not found");
                ErrorResponse {
                    requested_file: Some(requested_file.clone()),
                    resolved_path: Some(resolved_path.clone()),
                    ..ErrorResponse::new(
                        code::FILE_NOT_FOUND,
                        format!("File not found: {}", requested_file),
                    )
                }
            }
        };

        (status, Json(response)).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { .. } => ApiError::NotFound(code::NOT_FOUND, e.to_string()),
            ApplicationError::ValidationError(msg) => {
                ApiError::BadRequest(code::VALIDATION_ERROR, msg)
            }
            ApplicationError::InvalidPath(msg) => ApiError::BadRequest(code::INVALID_PATH, msg),
            ApplicationError::NoViewableEntry(_) => {
                ApiError::NotFound(code::NO_VIEWABLE_ENTRY, e.to_string())
            }
            // 不区分格式错误与不存在，避免暴露会话 ID 的形态
            ApplicationError::SessionNotFound(_) => {
                ApiError::NotFound(code::SESSION_NOT_FOUND, "Not Found".to_string())
            }
            ApplicationError::SessionExpired(_) => {
                ApiError::Gone(code::SESSION_EXPIRED, e.to_string())
            }
            ApplicationError::FileNotFound {
                requested_file,
                resolved_path,
            } => ApiError::FileNotFound {
                requested_file,
                resolved_path,
            },
            ApplicationError::StorageError(_) => {
                ApiError::Internal(code::STORAGE_ERROR, e.to_string())
            }
            ApplicationError::InternalError(msg) => ApiError::Internal(code::INTERNAL_ERROR, msg),
        }
    }
}

/// 预览页面错误
///
/// 会话不存在/过期与 HTML 文档缺失渲染为页面；
/// 子资源（CSS/JS/图片）缺失返回带诊断字段的 JSON
#[derive(Debug)]
pub struct PreviewPageError(pub ApplicationError);

impl From<ApplicationError> for PreviewPageError {
    fn from(e: ApplicationError) -> Self {
        Self(e)
    }
}

impl IntoResponse for PreviewPageError {
    fn into_response(self) -> Response {
        let (status, html) = match self.0 {
            ApplicationError::SessionNotFound(_) => pages::not_found_page(),
            ApplicationError::SessionExpired(_) => pages::expired_page(),
            ApplicationError::FileNotFound {
                requested_file,
                resolved_path,
            } => {
                if !is_html_path(&requested_file) {
                    return ApiError::FileNotFound {
                        requested_file,
                        resolved_path,
                    }
                    .into_response();
                }
                tracing::warn!(requested_file = %requested_file, resolved_path = %resolved_path, "Preview document not found");
                pages::missing_file_page(&requested_file, &resolved_path)
            }
            e @ (ApplicationError::StorageError(_) | ApplicationError::InternalError(_)) => {
                tracing::error!(error = %e, "Preview serving failed");
                pages::error_page(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
            }
            e => pages::error_page(StatusCode::BAD_REQUEST, &e.to_string()),
        };

        (
            status,
            [(header::CACHE_CONTROL, "no-store")],
            Html(html),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_application_errors_map_to_status_codes() {
        let cases = [
            (ApplicationError::validation("s3Path is required"), StatusCode::BAD_REQUEST),
            (ApplicationError::NoViewableEntry("demo".into()), StatusCode::NOT_FOUND),
            (ApplicationError::SessionExpired("preview-1".into()), StatusCode::GONE),
            (ApplicationError::StorageError("connection refused".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[tokio::test]
    async fn test_storage_error_keeps_cause() {
        let response =
            ApiError::from(ApplicationError::StorageError("connection refused".into())).into_response();
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "StorageError");
        assert!(json["message"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_missing_asset_is_json_with_diagnostics() {
        let err = ApplicationError::FileNotFound {
            requested_file: "missing.css".into(),
            resolved_path: "site/missing.css".into(),
        };
        let response = PreviewPageError(err).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["requestedFile"], "missing.css");
        assert_eq!(json["resolvedPath"], "site/missing.css");
        assert_eq!(json["error"], "FileNotFound");
    }

    #[tokio::test]
    async fn test_session_errors_render_pages() {
        let response = PreviewPageError(ApplicationError::SessionExpired("preview-1".into())).into_response();
        assert_eq!(response.status(), StatusCode::GONE);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }
}
