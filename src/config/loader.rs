//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, StorageBackend};
use crate::domain::preview::is_valid_id_prefix;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "SITEPREVIEW";

/// 加载应用配置
///
/// # 环境变量示例
/// - `SITEPREVIEW_SERVER__PORT=5200`
/// - `SITEPREVIEW_SERVER__BASE_URL=https://api.example.com`
/// - `SITEPREVIEW_STORAGE__PUBLIC_BASE_URL=https://s3.example.com`
/// - `SITEPREVIEW_STORAGE__BUCKET_PREFIX=codingpt/execute`
/// - `SITEPREVIEW_PREVIEW__SESSION_TTL_SECS=300`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5200)?
        .set_default("server.mount_path", "")?
        .set_default("server.max_body_bytes", 10 * 1024 * 1024)?
        .set_default("preview.session_ttl_secs", 300)?
        .set_default("preview.sweep_interval_secs", 60)?
        .set_default("preview.session_id_prefix", "preview-")?
        .set_default("preview.default_entry_file", "index.html")?
        .set_default("storage.backend", "http")?
        .set_default("storage.public_base_url", "https://s3.ghmate.com")?
        .set_default("storage.local_root", "data/storage")?
        .set_default("storage.bucket", "")?
        .set_default("storage.region", "ap-northeast-2")?
        .set_default("storage.force_path_style", false)?
        .set_default("storage.max_attempts", 3)?
        .set_default("storage.bucket_prefix", "codingpt/execute")?
        .set_default("storage.timeout_secs", 30)?
        .set_default("storage.max_object_bytes", 10 * 1024 * 1024)?
        .set_default("executor.enabled", true)?
        .set_default("executor.timeout_secs", 30)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），层级分隔符为 __
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.preview.session_ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Preview session TTL cannot be 0".to_string(),
        ));
    }

    if config.preview.sweep_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Sweep interval cannot be 0".to_string(),
        ));
    }

    if !is_valid_id_prefix(&config.preview.session_id_prefix) {
        return Err(ConfigError::ValidationError(format!(
            "Session id prefix must be non-empty and contain only [A-Za-z0-9_-]: {:?}",
            config.preview.session_id_prefix
        )));
    }

    if config.preview.default_entry_file.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Default entry file cannot be empty".to_string(),
        ));
    }

    if config.storage.backend == StorageBackend::Http
        && config.storage.public_base_url.trim().is_empty()
    {
        return Err(ConfigError::ValidationError(
            "Storage public_base_url cannot be empty for the http backend".to_string(),
        ));
    }

    if config.storage.backend == StorageBackend::S3 {
        if config.storage.bucket.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Storage bucket cannot be empty for the s3 backend".to_string(),
            ));
        }
        if config.storage.region.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Storage region cannot be empty for the s3 backend".to_string(),
            ));
        }
        if config.storage.access_key_id.is_some() != config.storage.secret_access_key.is_some() {
            return Err(ConfigError::ValidationError(
                "Storage access_key_id and secret_access_key must be set together".to_string(),
            ));
        }
    }

    if config.executor.enabled && config.executor.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Executor timeout cannot be 0 when the executor is enabled".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Public Base URL: {}", config.server.public_base_url());
    if !config.server.mount_path.is_empty() {
        tracing::info!("Mount Path: /{}", config.server.mount_path.trim_matches('/'));
    }
    tracing::info!("Session TTL: {}s", config.preview.session_ttl_secs);
    tracing::info!("Sweep Interval: {}s", config.preview.sweep_interval_secs);
    tracing::info!("Session ID Prefix: {}", config.preview.session_id_prefix);
    tracing::info!("Storage Backend: {}", config.storage.backend);
    match config.storage.backend {
        StorageBackend::Http => {
            tracing::info!("Storage URL: {}", config.storage.public_base_url)
        }
        StorageBackend::S3 => {
            tracing::info!("Storage Bucket: {}", config.storage.bucket);
            tracing::info!("Storage Region: {}", config.storage.region);
            if let Some(endpoint) = &config.storage.endpoint_url {
                tracing::info!("Storage Endpoint: {}", endpoint);
            }
            tracing::info!(
                "Storage Credentials: {}",
                if config.storage.access_key_id.is_some() {
                    "static"
                } else {
                    "default chain"
                }
            );
        }
        StorageBackend::File => {
            tracing::info!("Storage Root: {:?}", config.storage.local_root)
        }
    }
    tracing::info!("Bucket Prefix: {}", config.storage.bucket_prefix);
    tracing::info!("Executor Enabled: {}", config.executor.enabled);
    if config.executor.enabled {
        tracing::info!("Executor Timeout: {}s", config.executor.timeout_secs);
        tracing::info!("Executor Work Dir: {:?}", config.executor.work_dir);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
