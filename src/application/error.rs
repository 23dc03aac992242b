//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::StorageError;
use crate::domain::preview::PreviewError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {key}")]
    NotFound {
        resource_type: &'static str,
        key: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 路径非法或前缀歧义
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// 目录下找不到可预览的 HTML 文件
    #[error("No viewable entry file in {0}")]
    NoViewableEntry(String),

    /// 会话不存在（包括 ID 格式不符）
    #[error("Preview session not found: {0}")]
    SessionNotFound(String),

    /// 会话曾经有效但已过期
    #[error("Preview session expired: {0}")]
    SessionExpired(String),

    /// 会话内请求的文件在存储中不存在
    #[error("File not found in preview: {requested_file} ({resolved_path})")]
    FileNotFound {
        requested_file: String,
        resolved_path: String,
    },

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            key: key.into(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<PreviewError> for ApplicationError {
    fn from(err: PreviewError) -> Self {
        match err {
            PreviewError::InvalidSessionId(id) => Self::SessionNotFound(id),
            other => Self::InvalidPath(other.to_string()),
        }
    }
}

impl From<StorageError> for ApplicationError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => Self::not_found("Object", key),
            StorageError::InvalidKey(key) => Self::InvalidPath(key),
            other => Self::StorageError(other.to_string()),
        }
    }
}
