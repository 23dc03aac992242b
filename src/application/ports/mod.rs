//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod code_runner;
mod object_storage;
mod session_registry;

pub use code_runner::{CodeRunnerPort, ExecutionEvent, Language, RunnerError};
pub use object_storage::{EntryKind, ListEntry, ObjectStoragePort, StorageError, StoredObject};
pub use session_registry::SessionRegistryPort;
