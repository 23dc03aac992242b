//! Preview Context - 站点预览限界上下文
//!
//! 职责:
//! - 预览会话实体与会话 ID
//! - 存储路径规范化（bucket 前缀、入口文件拆分、子资源解析）

mod entities;
mod errors;
mod value_objects;

pub use entities::PreviewSession;
pub use errors::PreviewError;
pub use value_objects::{
    is_html_file_name, is_valid_id_prefix, join_key, normalize_entry_file, resolve_asset,
    split_entry, trim_slashes, validate_key, BucketPrefix, SessionId, DEFAULT_SESSION_ID_PREFIX,
};
