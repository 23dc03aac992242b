//! Object Storage Port - 对象存储网关
//!
//! 生成站点的 HTML/CSS/JS/资源文件都存放在对象存储中，预览只读取不写入

use async_trait::async_trait;
use thiserror::Error;

/// 对象存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object too large: {key} ({size} bytes, limit {limit} bytes)")]
    TooLarge { key: String, size: u64, limit: u64 },

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// 后端不可达或返回非预期状态，消息中保留底层错误
    #[error("Storage transport error: {0}")]
    Transport(String),
}

/// 读取到的对象
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    /// 存储后端上报的 Content-Type
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// 目录列举结果中的一项（只包含直接子项）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// 完整 key
    pub key: String,
    /// 相对目录的名称
    pub name: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
}

/// Object Storage Port
#[async_trait]
pub trait ObjectStoragePort: Send + Sync {
    /// 检查对象是否存在（HEAD）
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// 读取对象内容
    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError>;

    /// 列出目录下的直接子项，按名称排序；目录不存在时返回空列表
    async fn list_prefix(&self, dir: &str) -> Result<Vec<ListEntry>, StorageError>;
}
