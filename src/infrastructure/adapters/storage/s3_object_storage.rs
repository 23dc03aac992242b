//! S3 Object Storage - 带签名的 S3 API 访问
//!
//! 实现 ObjectStoragePort trait
//!
//! 使用 HeadObject / GetObject / ListObjectsV2；凭证取自配置，
//! 未配置时走 AWS 默认凭证链（环境变量、profile、实例角色）。

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::Client;
use std::time::Duration;

use super::listing::{collect_entries, list_prefix_of};
use crate::application::ports::{ListEntry, ObjectStoragePort, StorageError, StoredObject};
use crate::domain::preview::validate_key;

/// 列举分页上限
const MAX_LIST_PAGES: usize = 100;

/// S3 网关配置
#[derive(Debug, Clone)]
pub struct S3ObjectStorageConfig {
    pub bucket: String,
    pub region: String,
    /// S3 兼容服务（MinIO、R2 等）的端点，AWS 上留空
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub force_path_style: bool,
    /// 单次操作超时（秒），包含重试
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub max_object_bytes: u64,
}

impl Default for S3ObjectStorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "ap-northeast-2".to_string(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
            timeout_secs: 30,
            max_attempts: 3,
            max_object_bytes: 10 * 1024 * 1024,
        }
    }
}

impl S3ObjectStorageConfig {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    pub fn with_path_style(mut self, force_path_style: bool) -> Self {
        self.force_path_style = force_path_style;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_max_object_bytes(mut self, bytes: u64) -> Self {
        self.max_object_bytes = bytes;
        self
    }
}

/// S3 SDK 客户端
pub struct S3ObjectStorage {
    client: Client,
    config: S3ObjectStorageConfig,
}

impl S3ObjectStorage {
    pub async fn new(config: S3ObjectStorageConfig) -> Result<Self, StorageError> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::Transport("S3 bucket is not configured".to_string()));
        }

        let timeouts = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(config.timeout_secs))
            .build();
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .timeout_config(timeouts)
            .retry_config(RetryConfig::standard().with_max_attempts(config.max_attempts.max(1)));

        if let (Some(id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                id.clone(),
                secret.clone(),
                None,
                None,
                "sitepreview-config",
            ));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();

        tracing::info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = ?config.endpoint_url,
            static_credentials = config.access_key_id.is_some(),
            "S3 object storage initialised"
        );

        Ok(Self {
            client: Client::from_conf(s3_config),
            config,
        })
    }

    fn check_key(key: &str) -> Result<(), StorageError> {
        validate_key(key).map_err(|_| StorageError::InvalidKey(key.to_string()))
    }

    fn too_large(&self, key: &str, size: u64) -> Option<StorageError> {
        (size > self.config.max_object_bytes).then(|| StorageError::TooLarge {
            key: key.to_string(),
            size,
            limit: self.config.max_object_bytes,
        })
    }
}

/// 响应的 HTTP 状态码（请求未发出时为 None）
fn status_of<E>(err: &SdkError<E>) -> Option<u16> {
    err.raw_response().map(|r| r.status().as_u16())
}

fn transport<E>(op: &str, key: &str, err: SdkError<E>) -> StorageError
where
    E: std::error::Error + 'static,
{
    StorageError::Transport(format!("{} {}: {}", op, key, DisplayErrorContext(err)))
}

#[async_trait]
impl ObjectStoragePort for S3ObjectStorage {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Self::check_key(key)?;
        let result = self
            .client
            .head_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => match status_of(&e) {
                Some(403) | Some(404) => {
                    tracing::debug!(key = %key, status = ?status_of(&e), "S3 HEAD: object absent");
                    Ok(false)
                }
                _ => Err(transport("HeadObject", key, e)),
            },
        }
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError> {
        Self::check_key(key)?;
        let output = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match status_of(&e) {
                Some(403) | Some(404) => StorageError::NotFound(key.to_string()),
                _ => transport("GetObject", key, e),
            })?;

        if let Some(err) = output
            .content_length()
            .and_then(|len| u64::try_from(len).ok())
            .and_then(|len| self.too_large(key, len))
        {
            return Err(err);
        }

        let content_type = output.content_type().map(str::to_string);
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Transport(format!("GetObject {}: {}", key, e)))?
            .into_bytes();
        if let Some(err) = self.too_large(key, bytes.len() as u64) {
            return Err(err);
        }

        tracing::debug!(key = %key, size = bytes.len(), "S3 object fetched");

        Ok(StoredObject {
            bytes: bytes.to_vec(),
            content_type,
        })
    }

    async fn list_prefix(&self, dir: &str) -> Result<Vec<ListEntry>, StorageError> {
        if !dir.is_empty() {
            Self::check_key(dir)?;
        }
        let prefix = list_prefix_of(dir);

        let mut objects = Vec::new();
        let mut prefixes = Vec::new();
        let mut continuation: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.config.bucket)
                .delimiter("/");
            if !prefix.is_empty() {
                request = request.prefix(&prefix);
            }
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }

            let page = request
                .send()
                .await
                .map_err(|e| transport("ListObjectsV2", dir, e))?;

            objects.extend(page.contents().iter().filter_map(|o| {
                let size = o.size().and_then(|s| u64::try_from(s).ok());
                o.key().map(|key| (key.to_string(), size))
            }));
            prefixes.extend(
                page.common_prefixes()
                    .iter()
                    .filter_map(|p| p.prefix().map(str::to_string)),
            );

            continuation = page
                .next_continuation_token()
                .filter(|t| page.is_truncated() == Some(true) && !t.is_empty())
                .map(str::to_string);
            if continuation.is_none() {
                break;
            }
        }

        let entries = collect_entries(dir, objects, prefixes);
        tracing::debug!(dir = %dir, count = entries.len(), "S3 prefix listed");
        Ok(entries)
    }
}
