//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 预览会话配置
    #[serde(default)]
    pub preview: PreviewConfig,

    /// 对象存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 代码执行配置
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 公开访问的 Base URL（用于拼接 previewUrl）
    /// 如果未设置，则使用 http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,

    /// 预览路由对外的挂载路径（如经主后端转发时的 `api/executor`），空表示根路径
    #[serde(default)]
    pub mount_path: String,

    /// 请求体大小上限（字节），默认 10MB
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5200
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024 // 10 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
            mount_path: String::new(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            let host = if self.host == "0.0.0.0" {
                "localhost"
            } else {
                &self.host
            };
            format!("http://{}:{}", host, self.port)
        })
    }
}

/// 预览会话配置
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    /// 会话有效期（秒）
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// 过期清理间隔（秒）
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// 会话 ID 前缀，路由据此识别预览请求
    #[serde(default = "default_session_id_prefix")]
    pub session_id_prefix: String,

    /// 未指定入口文件时优先探测的文件名
    #[serde(default = "default_entry_file")]
    pub default_entry_file: String,
}

fn default_session_ttl() -> u64 {
    300 // 5 分钟
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_session_id_prefix() -> String {
    "preview-".to_string()
}

fn default_entry_file() -> String {
    "index.html".to_string()
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            session_id_prefix: default_session_id_prefix(),
            default_entry_file: default_entry_file(),
        }
    }
}

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// S3 兼容存储的公开 HTTP 端点
    #[default]
    Http,
    /// 带签名的 S3 API
    S3,
    /// 本地目录
    File,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Http => write!(f, "http"),
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::File => write!(f, "file"),
        }
    }
}

/// 对象存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// 存储公开访问地址（http 后端）
    #[serde(default = "default_storage_url")]
    pub public_base_url: String,

    /// 本地存储根目录（file 后端）
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,

    /// S3 bucket 名称（s3 后端）
    #[serde(default)]
    pub bucket: String,

    /// S3 区域（s3 后端）
    #[serde(default = "default_region")]
    pub region: String,

    /// S3 兼容服务的端点，AWS 上留空
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// 静态凭证，两者都设置时才生效，否则走 AWS 默认凭证链
    #[serde(default)]
    pub access_key_id: Option<String>,

    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// 使用 path-style 地址（MinIO 等需要）
    #[serde(default)]
    pub force_path_style: bool,

    /// S3 请求最大尝试次数
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 生成站点所在的 bucket 命名空间
    #[serde(default = "default_bucket_prefix")]
    pub bucket_prefix: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,

    /// 单个对象大小上限（字节），默认 10MB
    #[serde(default = "default_max_object_bytes")]
    pub max_object_bytes: u64,
}

fn default_storage_url() -> String {
    "https://s3.ghmate.com".to_string()
}

fn default_local_root() -> PathBuf {
    PathBuf::from("data/storage")
}

fn default_region() -> String {
    "ap-northeast-2".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_bucket_prefix() -> String {
    "codingpt/execute".to_string()
}

fn default_storage_timeout() -> u64 {
    30
}

fn default_max_object_bytes() -> u64 {
    10 * 1024 * 1024 // 10 MB
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            public_base_url: default_storage_url(),
            local_root: default_local_root(),
            bucket: String::new(),
            region: default_region(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
            max_attempts: default_max_attempts(),
            bucket_prefix: default_bucket_prefix(),
            timeout_secs: default_storage_timeout(),
            max_object_bytes: default_max_object_bytes(),
        }
    }
}

/// 代码执行配置
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorConfig {
    /// 是否启用 /execute
    #[serde(default = "default_executor_enabled")]
    pub enabled: bool,

    /// 单次执行超时（秒）
    #[serde(default = "default_executor_timeout")]
    pub timeout_secs: u64,

    /// 临时文件目录
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

fn default_executor_enabled() -> bool {
    true
}

fn default_executor_timeout() -> u64 {
    30
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("code-execute")
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            enabled: default_executor_enabled(),
            timeout_secs: default_executor_timeout(),
            work_dir: default_work_dir(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
