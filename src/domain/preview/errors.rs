//! Preview Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreviewError {
    #[error("无效的存储路径: {0}")]
    InvalidPath(String),

    #[error("存储路径与前缀 {prefix} 部分重叠，无法判断是否需要补全: {path}")]
    AmbiguousPrefix { path: String, prefix: String },

    #[error("无效的会话 ID: {0}")]
    InvalidSessionId(String),
}
