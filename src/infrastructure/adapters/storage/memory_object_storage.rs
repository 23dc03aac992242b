//! In-Memory Object Storage - 内存对象存储
//!
//! 用于测试与无外部依赖的本地运行

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::application::ports::{EntryKind, ListEntry, ObjectStoragePort, StorageError, StoredObject};
use crate::domain::preview::join_key;

#[derive(Default)]
pub struct InMemoryObjectStorage {
    objects: DashMap<String, StoredObject>,
    unavailable: AtomicBool,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: &str, bytes: impl Into<Vec<u8>>, content_type: Option<&str>) {
        self.objects.insert(
            key.to_string(),
            StoredObject {
                bytes: bytes.into(),
                content_type: content_type.map(str::to_string),
            },
        );
    }

    pub fn remove(&self, key: &str) -> bool {
        self.objects.remove(key).is_some()
    }

    /// 模拟后端不可达，之后的所有调用返回 Transport 错误
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Transport("in-memory storage unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ObjectStoragePort for InMemoryObjectStorage {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.check_available()?;
        Ok(self.objects.contains_key(key))
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError> {
        self.check_available()?;
        self.objects
            .get(key)
            .map(|o| o.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn list_prefix(&self, dir: &str) -> Result<Vec<ListEntry>, StorageError> {
        self.check_available()?;
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };

        // BTreeMap 去重目录并保证按名称排序
        let mut children: BTreeMap<String, ListEntry> = BTreeMap::new();
        for entry in self.objects.iter() {
            let Some(rest) = entry.key().strip_prefix(&prefix) else {
                continue;
            };
            let item = match rest.split_once('/') {
                Some((sub, _)) => ListEntry {
                    key: join_key(dir, sub),
                    name: sub.to_string(),
                    kind: EntryKind::Directory,
                    size: None,
                },
                None => ListEntry {
                    key: entry.key().clone(),
                    name: rest.to_string(),
                    kind: EntryKind::File,
                    size: Some(entry.value().bytes.len() as u64),
                },
            };
            if !item.name.is_empty() {
                children.entry(item.name.clone()).or_insert(item);
            }
        }

        Ok(children.into_values().collect())
    }
}
