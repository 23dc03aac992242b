//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：通过预览会话读取站点文件

mod preview_queries;

pub mod handlers;

pub use preview_queries::*;
