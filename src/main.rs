//! SitePreview - 生成站点的临时预览服务
//!
//! 启动顺序: 配置 → 日志 → 存储网关 → 会话注册表 → ExpirySweeper → HTTP 服务器

use std::sync::Arc;

use sitepreview::application::{CodeRunnerPort, ObjectStoragePort, PreviewSettings};
use sitepreview::config::{load_config, print_config, AppConfig, StorageBackend};
use sitepreview::domain::preview::BucketPrefix;
use sitepreview::infrastructure::adapters::{
    FileObjectStorage, HttpObjectStorage, HttpObjectStorageConfig, ProcessCodeRunner,
    ProcessRunnerConfig, S3ObjectStorage, S3ObjectStorageConfig,
};
use sitepreview::infrastructure::http::{AppState, HttpServer, ServerConfig};
use sitepreview::infrastructure::memory::{InMemorySessionRegistry, RegistryConfig};
use sitepreview::infrastructure::worker::{ExpirySweeper, ExpirySweeperConfig};
use tokio::sync::watch;

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},sitepreview={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_storage(config: &AppConfig) -> anyhow::Result<Arc<dyn ObjectStoragePort>> {
    let storage: Arc<dyn ObjectStoragePort> = match config.storage.backend {
        StorageBackend::Http => {
            let storage_config = HttpObjectStorageConfig::new(&config.storage.public_base_url)
                .with_timeout(config.storage.timeout_secs)
                .with_max_object_bytes(config.storage.max_object_bytes);
            Arc::new(HttpObjectStorage::new(storage_config)?)
        }
        StorageBackend::S3 => {
            let storage = &config.storage;
            let mut s3_config = S3ObjectStorageConfig::new(&storage.bucket, &storage.region)
                .with_path_style(storage.force_path_style)
                .with_max_attempts(storage.max_attempts)
                .with_max_object_bytes(storage.max_object_bytes);
            s3_config.timeout_secs = storage.timeout_secs;
            if let Some(endpoint) = &storage.endpoint_url {
                s3_config = s3_config.with_endpoint(endpoint);
            }
            if let (Some(id), Some(secret)) = (&storage.access_key_id, &storage.secret_access_key) {
                s3_config = s3_config.with_credentials(id, secret);
            }
            Arc::new(S3ObjectStorage::new(s3_config).await?)
        }
        StorageBackend::File => Arc::new(FileObjectStorage::new(
            &config.storage.local_root,
            config.storage.max_object_bytes,
        )),
    };
    Ok(storage)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("SitePreview - 生成站点预览服务");
    print_config(&config);

    if config.storage.backend == StorageBackend::File {
        tokio::fs::create_dir_all(&config.storage.local_root).await?;
    }

    // 对象存储网关
    let storage = build_storage(&config).await?;

    // 内存会话注册表
    let registry = Arc::new(InMemorySessionRegistry::new(RegistryConfig {
        ttl_secs: config.preview.session_ttl_secs,
        id_prefix: config.preview.session_id_prefix.clone(),
    }));

    // 启动 ExpirySweeper
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = ExpirySweeper::new(
        ExpirySweeperConfig {
            interval_secs: config.preview.sweep_interval_secs,
        },
        registry.clone(),
        shutdown_rx,
    );
    let sweeper_handle = tokio::spawn(sweeper.run());

    // 代码执行器（可关闭）
    let runner: Option<Arc<dyn CodeRunnerPort>> = if config.executor.enabled {
        Some(Arc::new(ProcessCodeRunner::new(ProcessRunnerConfig {
            timeout_secs: config.executor.timeout_secs,
            work_dir: config.executor.work_dir.clone(),
        })))
    } else {
        None
    };

    let settings = PreviewSettings {
        public_base_url: config.server.public_base_url(),
        mount_path: String::new(),
        bucket_prefix: BucketPrefix::new(&config.storage.bucket_prefix),
        default_entry_file: config.preview.default_entry_file.clone(),
        session_id_prefix: config.preview.session_id_prefix.clone(),
    }
    .with_mount_path(&config.server.mount_path);

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port)
        .with_max_body_bytes(config.server.max_body_bytes);
    let state = AppState::new(settings, storage, registry, runner);
    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper_handle.await {
        tracing::warn!(error = %e, "ExpirySweeper task ended abnormally");
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}
