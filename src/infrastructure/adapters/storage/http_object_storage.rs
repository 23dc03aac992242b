//! HTTP Object Storage - 通过公开 HTTP 端点读取 S3 兼容存储
//!
//! 实现 ObjectStoragePort trait
//!
//! - 读取: `GET {public_base_url}/{key}`
//! - 存在性: `HEAD {public_base_url}/{key}`
//! - 列举: `GET {public_base_url}?list-type=2&prefix={dir}/&delimiter=/`（ListObjectsV2）

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::listing::{collect_entries, list_prefix_of};
use crate::application::ports::{ListEntry, ObjectStoragePort, StorageError, StoredObject};
use crate::domain::preview::validate_key;

/// 列举分页上限，防止异常响应导致死循环
const MAX_LIST_PAGES: usize = 100;

/// HTTP 对象存储配置
#[derive(Debug, Clone)]
pub struct HttpObjectStorageConfig {
    /// 存储公开访问地址（含 bucket）
    pub public_base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 单个对象大小上限（字节）
    pub max_object_bytes: u64,
}

impl Default for HttpObjectStorageConfig {
    fn default() -> Self {
        Self {
            public_base_url: "https://s3.ghmate.com".to_string(),
            timeout_secs: 30,
            max_object_bytes: 10 * 1024 * 1024,
        }
    }
}

impl HttpObjectStorageConfig {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_max_object_bytes(mut self, bytes: u64) -> Self {
        self.max_object_bytes = bytes;
        self
    }
}

/// HTTP 对象存储客户端
pub struct HttpObjectStorage {
    client: Client,
    base_url: Url,
    config: HttpObjectStorageConfig,
}

impl HttpObjectStorage {
    pub fn new(config: HttpObjectStorageConfig) -> Result<Self, StorageError> {
        let base_url = Url::parse(config.public_base_url.trim_end_matches('/'))
            .map_err(|e| StorageError::Transport(format!("invalid storage URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StorageError::Transport(format!(
                "invalid storage URL: {}",
                config.public_base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// 对象 URL，按段编码 key
    fn object_url(&self, key: &str) -> Result<Url, StorageError> {
        validate_key(key).map_err(|_| StorageError::InvalidKey(key.to_string()))?;

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidKey(key.to_string()))?
            .pop_if_empty()
            .extend(key.split('/'));
        Ok(url)
    }

    fn list_url(&self, dir: &str, continuation: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("list-type", "2");
            query.append_pair("delimiter", "/");
            if !dir.is_empty() {
                query.append_pair("prefix", &list_prefix_of(dir));
            }
            if let Some(token) = continuation {
                query.append_pair("continuation-token", token);
            }
        }
        url
    }

    fn transport_error(key: &str, e: reqwest::Error) -> StorageError {
        if e.is_timeout() {
            StorageError::Transport(format!("timeout while fetching {}: {}", key, e))
        } else {
            StorageError::Transport(format!("{}: {}", key, e))
        }
    }
}

#[async_trait]
impl ObjectStoragePort for HttpObjectStorage {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let url = self.object_url(key)?;
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| Self::transport_error(key, e))?;

        let status = response.status();
        tracing::debug!(key = %key, status = %status, "Storage HEAD");

        match status {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => Ok(false),
            s => Err(StorageError::Transport(format!("HEAD {} returned HTTP {}", key, s))),
        }
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError> {
        let url = self.object_url(key)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::transport_error(key, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN {
            return Err(StorageError::NotFound(key.to_string()));
        }
        if !status.is_success() {
            return Err(StorageError::Transport(format!("GET {} returned HTTP {}", key, status)));
        }

        let limit = self.config.max_object_bytes;
        if let Some(size) = response.content_length().filter(|size| *size > limit) {
            return Err(StorageError::TooLarge {
                key: key.to_string(),
                size,
                limit,
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::transport_error(key, e))?;
        if bytes.len() as u64 > limit {
            return Err(StorageError::TooLarge {
                key: key.to_string(),
                size: bytes.len() as u64,
                limit,
            });
        }

        tracing::debug!(key = %key, size = bytes.len(), "Storage object fetched");

        Ok(StoredObject {
            bytes: bytes.to_vec(),
            content_type,
        })
    }

    async fn list_prefix(&self, dir: &str) -> Result<Vec<ListEntry>, StorageError> {
        if !dir.is_empty() {
            validate_key(dir).map_err(|_| StorageError::InvalidKey(dir.to_string()))?;
        }

        let mut objects = Vec::new();
        let mut prefixes = Vec::new();
        let mut continuation: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let url = self.list_url(dir, continuation.as_deref());
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| Self::transport_error(dir, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(StorageError::Transport(format!(
                    "list {} returned HTTP {}",
                    dir, status
                )));
            }

            let body = response
                .text()
                .await
                .map_err(|e| Self::transport_error(dir, e))?;
            let page = parse_list_page(&body)?;

            objects.extend(page.contents.into_iter().map(|o| (o.key, o.size)));
            prefixes.extend(page.common_prefixes.into_iter().map(|p| p.prefix));

            match page.next_continuation_token.filter(|t| page.is_truncated && !t.is_empty()) {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        let entries = collect_entries(dir, objects, prefixes);
        tracing::debug!(dir = %dir, count = entries.len(), "Storage prefix listed");
        Ok(entries)
    }
}

/// ListObjectsV2 响应
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    contents: Vec<ListedObject>,
    #[serde(default)]
    common_prefixes: Vec<ListedPrefix>,
    #[serde(default)]
    is_truncated: bool,
    next_continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListedObject {
    key: String,
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListedPrefix {
    prefix: String,
}

fn parse_list_page(xml: &str) -> Result<ListBucketResult, StorageError> {
    quick_xml::de::from_str(xml)
        .map_err(|e| StorageError::Transport(format!("malformed list response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::EntryKind;
    use axum::{
        extract::{Path, Query},
        http::StatusCode as AxumStatus,
        response::{IntoResponse, Response},
        routing::get,
        Router,
    };
    use std::collections::HashMap;

    const PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>bucket</Name>
  <Prefix>codingpt/execute/demo/</Prefix>
  <IsTruncated>true</IsTruncated>
  <NextContinuationToken>token&amp;2</NextContinuationToken>
  <Contents><Key>codingpt/execute/demo/</Key><Size>0</Size></Contents>
  <Contents><Key>codingpt/execute/demo/main.html</Key><Size>120</Size></Contents>
  <CommonPrefixes><Prefix>codingpt/execute/demo/assets/</Prefix></CommonPrefixes>
  <Contents><Key>codingpt/execute/demo/&#xD55C;&#44544;.css</Key><Size>7</Size></Contents>
</ListBucketResult>"#;

    #[test]
    fn test_parse_list_page() {
        let page = parse_list_page(PAGE).unwrap();

        assert!(page.is_truncated);
        assert_eq!(page.next_continuation_token.as_deref(), Some("token&2"));
        assert_eq!(page.contents.len(), 3);
        assert_eq!(page.contents[1].size, Some(120));
        assert_eq!(page.contents[2].key, "codingpt/execute/demo/한글.css");
        assert_eq!(page.common_prefixes[0].prefix, "codingpt/execute/demo/assets/");
    }

    #[test]
    fn test_parse_empty_and_malformed_pages() {
        let page = parse_list_page("<ListBucketResult><IsTruncated>false</IsTruncated></ListBucketResult>")
            .unwrap();
        assert!(page.contents.is_empty());
        assert!(!page.is_truncated);

        assert!(matches!(
            parse_list_page("<ListBucketResult><Contents>"),
            Err(StorageError::Transport(_))
        ));
    }

    #[test]
    fn test_object_url_encodes_segments() {
        let storage =
            HttpObjectStorage::new(HttpObjectStorageConfig::new("https://s3.example.com/bucket/"))
                .unwrap();
        let url = storage.object_url("codingpt/execute/my site/index.html").unwrap();
        assert_eq!(
            url.as_str(),
            "https://s3.example.com/bucket/codingpt/execute/my%20site/index.html"
        );
        assert!(storage.object_url("../etc/passwd").is_err());
    }

    #[test]
    fn test_list_url() {
        let storage =
            HttpObjectStorage::new(HttpObjectStorageConfig::new("https://s3.example.com")).unwrap();
        let url = storage.list_url("codingpt/demo", Some("t1"));
        assert_eq!(
            url.as_str(),
            "https://s3.example.com/?list-type=2&delimiter=%2F&prefix=codingpt%2Fdemo%2F&continuation-token=t1"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(HttpObjectStorage::new(HttpObjectStorageConfig::new("not a url")).is_err());
    }

    // ---------- 本地 HTTP 服务 ----------

    async fn object(Path(key): Path<String>) -> Response {
        match key.as_str() {
            "site/index.html" => ([("content-type", "text/html")], "<p>hi</p>").into_response(),
            "site/private.html" => AxumStatus::FORBIDDEN.into_response(),
            "site/flaky.html" => (AxumStatus::SERVICE_UNAVAILABLE, "SlowDown").into_response(),
            "site/big.bin" => vec![0u8; 2048].into_response(),
            _ => AxumStatus::NOT_FOUND.into_response(),
        }
    }

    async fn list(Query(params): Query<HashMap<String, String>>) -> Response {
        let body = match params.get("continuation-token").map(String::as_str) {
            None => format!(
                "<ListBucketResult><IsTruncated>true</IsTruncated>\
                 <NextContinuationToken>p2</NextContinuationToken>\
                 <Contents><Key>{}zeta.html</Key><Size>5</Size></Contents></ListBucketResult>",
                params.get("prefix").cloned().unwrap_or_default()
            ),
            Some(_) => "<ListBucketResult><IsTruncated>false</IsTruncated>\
                        <Contents><Key>site/about.html</Key><Size>3</Size></Contents>\
                        <CommonPrefixes><Prefix>site/css/</Prefix></CommonPrefixes></ListBucketResult>"
                .to_string(),
        };
        ([("content-type", "application/xml")], body).into_response()
    }

    async fn local_storage(max_object_bytes: u64) -> HttpObjectStorage {
        let router = Router::new()
            .route("/bucket", get(list))
            .route("/bucket/*key", get(object));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = HttpObjectStorageConfig::new(format!("http://{}/bucket", addr))
            .with_timeout(5)
            .with_max_object_bytes(max_object_bytes);
        HttpObjectStorage::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_head_status_mapping() {
        let storage = local_storage(1024).await;

        assert!(storage.exists("site/index.html").await.unwrap());
        assert!(!storage.exists("site/missing.html").await.unwrap());
        assert!(!storage.exists("site/private.html").await.unwrap());
        match storage.exists("site/flaky.html").await {
            Err(StorageError::Transport(msg)) => assert!(msg.contains("503"), "{}", msg),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_status_mapping() {
        let storage = local_storage(1024).await;

        let object = storage.get_object("site/index.html").await.unwrap();
        assert_eq!(object.bytes, b"<p>hi</p>");
        assert_eq!(object.content_type.as_deref(), Some("text/html"));

        assert!(matches!(
            storage.get_object("site/missing.html").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.get_object("site/private.html").await,
            Err(StorageError::NotFound(_))
        ));
        match storage.get_object("site/flaky.html").await {
            Err(StorageError::Transport(msg)) => assert!(msg.contains("503"), "{}", msg),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_oversized_object_is_rejected() {
        let storage = local_storage(1024).await;
        match storage.get_object("site/big.bin").await {
            Err(StorageError::TooLarge { size, limit, .. }) => {
                assert_eq!(size, 2048);
                assert_eq!(limit, 1024);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_follows_continuation() {
        let storage = local_storage(1024).await;
        let entries = storage.list_prefix("site").await.unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["about.html", "css", "zeta.html"]);
        assert_eq!(entries[1].kind, EntryKind::Directory);
    }
}
