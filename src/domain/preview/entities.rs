//! Preview Context - Entities

use chrono::{DateTime, Duration, Utc};

use super::value_objects::{join_key, SessionId};

/// 预览会话
///
/// 不变量:
/// - `expires_at = created_at + ttl`
/// - `storage_path = base_dir/entry_file`，用于同一站点的会话去重
/// - `now > expires_at` 之后会话在逻辑上已失效，即使尚未被清理
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSession {
    pub id: SessionId,
    pub storage_path: String,
    pub base_dir: String,
    pub entry_file: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// 入口文档首次成功返回后置为 true
    pub is_active: bool,
    pub accessed_at: Option<DateTime<Utc>>,
}

impl PreviewSession {
    pub fn new(
        id: SessionId,
        base_dir: impl Into<String>,
        entry_file: impl Into<String>,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let base_dir = base_dir.into();
        let entry_file = entry_file.into();
        Self {
            id,
            storage_path: join_key(&base_dir, &entry_file),
            base_dir,
            entry_file,
            created_at,
            expires_at: created_at + ttl,
            is_active: false,
            accessed_at: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// 记录一次 HTML 文档访问
    pub fn mark_served(&mut self, now: DateTime<Utc>) {
        self.is_active = true;
        self.accessed_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_at(created_at: DateTime<Utc>) -> PreviewSession {
        PreviewSession::new(
            SessionId::generate("preview-"),
            "codingpt/execute/demo",
            "index.html",
            created_at,
            Duration::seconds(300),
        )
    }

    #[test]
    fn test_expiry_boundary() {
        let created = Utc::now();
        let session = session_at(created);
        assert_eq!(session.storage_path, "codingpt/execute/demo/index.html");
        assert!(!session.is_expired_at(created + Duration::seconds(300)));
        assert!(session.is_expired_at(created + Duration::seconds(300) + Duration::milliseconds(1)));
    }

    #[test]
    fn test_mark_served() {
        let created = Utc::now();
        let mut session = session_at(created);
        assert!(!session.is_active);

        session.mark_served(created + Duration::seconds(1));
        session.mark_served(created + Duration::seconds(2));
        assert!(session.is_active);
        assert_eq!(session.accessed_at, Some(created + Duration::seconds(2)));
    }
}
