//! Object Storage Adapters
//!
//! - HttpObjectStorage: S3 兼容存储的公开 HTTP 端点
//! - S3ObjectStorage: 带签名的 S3 API
//! - FileObjectStorage: 本地目录
//! - InMemoryObjectStorage: 内存（测试）

mod file_object_storage;
mod http_object_storage;
mod listing;
mod memory_object_storage;
mod s3_object_storage;

pub use file_object_storage::FileObjectStorage;
pub use http_object_storage::{HttpObjectStorage, HttpObjectStorageConfig};
pub use memory_object_storage::InMemoryObjectStorage;
pub use s3_object_storage::{S3ObjectStorage, S3ObjectStorageConfig};
