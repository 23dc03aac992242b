//! Session Registry Port - 预览会话注册表
//!
//! 会话表与反向索引（storage_path -> session_id）只能通过这里的操作修改，
//! 两者的插入/删除总是成对发生

use chrono::{DateTime, Utc};

use crate::domain::preview::{PreviewSession, SessionId};

/// Session Registry Port
///
/// 所有状态存储在进程内存中，进程重启即丢失
pub trait SessionRegistryPort: Send + Sync {
    /// 创建会话；同一 storage_path 已有会话时先将其淘汰
    fn create_at(&self, base_dir: &str, entry_file: &str, now: DateTime<Utc>) -> PreviewSession;

    fn create(&self, base_dir: &str, entry_file: &str) -> PreviewSession {
        self.create_at(base_dir, entry_file, Utc::now())
    }

    /// 纯查询，不检查也不修改过期状态
    fn get(&self, id: &SessionId) -> Option<PreviewSession>;

    /// 标记会话已被访问，返回会话是否存在
    fn touch_at(&self, id: &SessionId, now: DateTime<Utc>) -> bool;

    fn touch(&self, id: &SessionId) -> bool {
        self.touch_at(id, Utc::now())
    }

    /// 删除会话及其反向索引，返回是否确实删除了内容；重复调用是安全的
    fn evict(&self, id: &SessionId) -> bool;

    /// 淘汰所有 `now > expires_at` 的会话，返回淘汰数量
    fn sweep_expired(&self, now: DateTime<Utc>) -> usize;

    /// 反向索引查询
    fn session_for_path(&self, storage_path: &str) -> Option<SessionId>;

    /// 当前会话数量（包含已过期但尚未清理的）
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
