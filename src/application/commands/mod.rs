//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：创建/过期预览会话、执行代码

mod execute_commands;
mod preview_commands;

pub mod handlers;

pub use execute_commands::*;
pub use preview_commands::*;
