//! Execute Commands - 代码执行命令

/// 执行代码命令
#[derive(Debug, Clone)]
pub struct ExecuteCodeCommand {
    pub code: String,
    pub language: String,
}
