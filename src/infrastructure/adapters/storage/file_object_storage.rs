//! File Object Storage - 本地目录模拟对象存储
//!
//! 实现 ObjectStoragePort trait，key 按 `/` 映射为相对 `root` 的路径，用于本地开发

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{EntryKind, ListEntry, ObjectStoragePort, StorageError, StoredObject};
use crate::domain::preview::{join_key, validate_key};

/// 文件系统对象存储
pub struct FileObjectStorage {
    /// 存储根目录
    root: PathBuf,
    max_object_bytes: u64,
}

impl FileObjectStorage {
    pub fn new(root: impl AsRef<Path>, max_object_bytes: u64) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_object_bytes,
        }
    }

    /// 获取存储根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key).map_err(|_| StorageError::InvalidKey(key.to_string()))?;
        Ok(key.split('/').fold(self.root.clone(), |path, seg| path.join(seg)))
    }
}

fn io_error(key: &str, e: std::io::Error) -> StorageError {
    if e.kind() == ErrorKind::NotFound {
        StorageError::NotFound(key.to_string())
    } else {
        StorageError::Transport(format!("{}: {}", key, e))
    }
}

#[async_trait]
impl ObjectStoragePort for FileObjectStorage {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError> {
        let path = self.path_for(key)?;
        let meta = fs::metadata(&path).await.map_err(|e| io_error(key, e))?;
        if !meta.is_file() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        if meta.len() > self.max_object_bytes {
            return Err(StorageError::TooLarge {
                key: key.to_string(),
                size: meta.len(),
                limit: self.max_object_bytes,
            });
        }

        let bytes = fs::read(&path).await.map_err(|e| io_error(key, e))?;
        tracing::debug!(key = %key, size = bytes.len(), "Local object read");

        Ok(StoredObject {
            bytes,
            content_type: None,
        })
    }

    async fn list_prefix(&self, dir: &str) -> Result<Vec<ListEntry>, StorageError> {
        let path = if dir.is_empty() {
            self.root.clone()
        } else {
            self.path_for(dir)?
        };

        let mut read_dir = match fs::read_dir(&path).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(dir, e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(|e| io_error(dir, e))? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type().await.map_err(|e| io_error(dir, e))?;
            let (kind, size) = if file_type.is_dir() {
                (EntryKind::Directory, None)
            } else {
                let size = entry.metadata().await.ok().map(|m| m.len());
                (EntryKind::File, size)
            };
            entries.push(ListEntry {
                key: join_key(dir, &name),
                name,
                kind,
                size,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
