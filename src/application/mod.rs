//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（ObjectStorage、SessionRegistry、CodeRunner）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - settings: 预览 URL 与会话 ID 的生成规则
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod settings;

// Re-exports
pub use commands::{
    // Preview commands
    CreatePreviewCommand,
    CreatePreviewResponse,
    ExpirePreviewCommand,
    ExpirePreviewResponse,
    // Execute commands
    ExecuteCodeCommand,
    // Handlers
    handlers::{CreatePreviewHandler, ExecuteCodeHandler, ExpirePreviewHandler},
};

pub use error::ApplicationError;

pub use ports::{
    // Code runner
    CodeRunnerPort,
    ExecutionEvent,
    Language,
    RunnerError,
    // Object storage
    EntryKind,
    ListEntry,
    ObjectStoragePort,
    StorageError,
    StoredObject,
    // Session registry
    SessionRegistryPort,
};

pub use queries::{
    // Preview queries
    ServePreviewFileQuery,
    ServePreviewFileResponse,
    // Handlers
    handlers::ServePreviewFileHandler,
};

pub use settings::PreviewSettings;
