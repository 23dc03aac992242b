//! SitePreview - 生成站点的临时预览服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Preview Context: 预览会话、会话 ID、存储路径规则
//! - HTML 改写与内容类型判定
//!
//! 应用层 (application/):
//! - Ports: 端口定义（ObjectStorage, SessionRegistry, CodeRunner）
//! - Commands: 创建/过期预览、执行代码
//! - Queries: 会话内文件读取
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: 预览、过期、代码执行（SSE）与健康检查接口
//! - Memory: SessionRegistry 内存实现
//! - Worker: ExpirySweeper 后台清理
//! - Adapters: 对象存储网关、子进程代码执行器

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
