//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod execute_handlers;
mod preview_command_handlers;

pub use execute_handlers::*;
pub use preview_command_handlers::*;
