//! In-Memory Session Registry Implementation

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::SessionRegistryPort;
use crate::domain::preview::{join_key, PreviewSession, SessionId, DEFAULT_SESSION_ID_PREFIX};

/// 注册表配置
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// 会话有效期（秒）
    pub ttl_secs: u64,
    /// 会话 ID 前缀
    pub id_prefix: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            id_prefix: DEFAULT_SESSION_ID_PREFIX.to_string(),
        }
    }
}

/// 内存会话注册表
///
/// `path_index` 的 entry 锁串行化同一 storage_path 上的创建，
/// 持有 entry 期间完成旧会话删除、新会话插入和索引更新
pub struct InMemorySessionRegistry {
    config: RegistryConfig,
    sessions: DashMap<SessionId, PreviewSession>,
    path_index: DashMap<String, SessionId>,
}

impl InMemorySessionRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
            path_index: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn ttl(&self) -> Duration {
        Duration::seconds(self.config.ttl_secs.min(i64::MAX as u64) as i64)
    }
}

impl Default for InMemorySessionRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl SessionRegistryPort for InMemorySessionRegistry {
    fn create_at(&self, base_dir: &str, entry_file: &str, now: DateTime<Utc>) -> PreviewSession {
        let storage_path = join_key(base_dir, entry_file);
        let session = PreviewSession::new(
            SessionId::generate(&self.config.id_prefix),
            base_dir,
            entry_file,
            now,
            self.ttl(),
        );
        let new_id = session.id.clone();

        match self.path_index.entry(storage_path.clone()) {
            Entry::Occupied(mut occupied) => {
                let previous = occupied.get().clone();
                if self.sessions.remove(&previous).is_some() {
                    tracing::info!(
                        session_id = %previous,
                        storage_path = %storage_path,
                        "Superseded preview session evicted"
                    );
                }
                self.sessions.insert(new_id.clone(), session.clone());
                occupied.insert(new_id.clone());
            }
            Entry::Vacant(vacant) => {
                self.sessions.insert(new_id.clone(), session.clone());
                vacant.insert(new_id.clone());
            }
        }

        tracing::debug!(
            session_id = %new_id,
            storage_path = %storage_path,
            expires_at = %session.expires_at,
            "Preview session registered"
        );
        session
    }

    fn get(&self, id: &SessionId) -> Option<PreviewSession> {
        self.sessions.get(id).map(|s| s.clone())
    }

    fn touch_at(&self, id: &SessionId, now: DateTime<Utc>) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut session) => {
                let first = !session.is_active;
                session.mark_served(now);
                if first {
                    tracing::debug!(session_id = %id, "Preview session activated");
                }
                true
            }
            None => false,
        }
    }

    fn evict(&self, id: &SessionId) -> bool {
        let Some((_, session)) = self.sessions.remove(id) else {
            return false;
        };
        self.path_index
            .remove_if(&session.storage_path, |_, indexed| indexed == id);
        tracing::debug!(session_id = %id, storage_path = %session.storage_path, "Preview session evicted");
        true
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| entry.key().clone())
            .collect();

        expired.iter().filter(|id| self.evict(id)).count()
    }

    fn session_for_path(&self, storage_path: &str) -> Option<SessionId> {
        self.path_index.get(storage_path).map(|id| id.clone())
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}
