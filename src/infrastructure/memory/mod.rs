//! Memory Layer - In-Memory State Management
//!
//! 实现 SessionRegistry，管理预览会话与反向索引的内存状态

mod session_registry;

pub use session_registry::{InMemorySessionRegistry, RegistryConfig};
