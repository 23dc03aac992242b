//! Preview Context - Value Objects

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PreviewError;

/// 默认会话 ID 前缀，路由据此区分预览流量与其他路由
pub const DEFAULT_SESSION_ID_PREFIX: &str = "preview-";

#[inline]
fn is_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// 检查会话 ID 前缀是否可安全放进 URL 路径
pub fn is_valid_id_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && prefix.bytes().all(is_id_byte)
}

/// 预览会话 ID
///
/// 格式: `{prefix}{unix_millis}-{uuid v4}`，不可猜测的部分来自 uuid 的随机位。
/// 会话 ID 本身就是访问凭证。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate(prefix: &str) -> Self {
        Self(format!(
            "{}{}-{}",
            prefix,
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        ))
    }

    /// 解析外部传入的会话 ID，前缀不符或包含非 URL 安全字符时拒绝
    pub fn parse(prefix: &str, raw: &str) -> Result<Self, PreviewError> {
        let valid = raw.len() > prefix.len()
            && raw.starts_with(prefix)
            && raw.bytes().all(is_id_byte);
        if !valid {
            return Err(PreviewError::InvalidSessionId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 去掉首尾斜杠
pub fn trim_slashes(path: &str) -> &str {
    path.trim_matches('/')
}

/// 校验存储 key，防止路径穿越
///
/// 拒绝: 空路径、`..`/`.` 段、`//`、反斜杠、控制字符
pub fn validate_key(key: &str) -> Result<(), PreviewError> {
    if key.is_empty() {
        return Err(PreviewError::InvalidPath("路径为空".to_string()));
    }
    if key.contains("//") || key.contains('\\') || key.chars().any(|c| c.is_control()) {
        return Err(PreviewError::InvalidPath(key.to_string()));
    }
    if key.split('/').any(|seg| seg == ".." || seg == ".") {
        return Err(PreviewError::InvalidPath(key.to_string()));
    }
    Ok(())
}

/// 拼接目录与文件，目录为空时直接返回文件
pub fn join_key(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

/// 判断文件名是否为 HTML 文档
pub fn is_html_file_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".html") || lower.ends_with(".htm")
}

/// 生成站点所在的 bucket 命名空间前缀（如 `codingpt/execute`）
///
/// 补全规则:
/// - 路径按段完整匹配前缀 → 原样保留
/// - 路径只匹配前缀的开头几段（如 `codingpt/site`）→ 视为歧义，直接报错
/// - 其余情况 → 补全前缀
///
/// 前缀永远不会被重复添加。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketPrefix(String);

impl BucketPrefix {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(trim_slashes(raw.as_ref()).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 规范化目录路径并补全前缀
    pub fn apply(&self, raw: &str) -> Result<String, PreviewError> {
        let dir = trim_slashes(raw.trim());
        validate_key(dir)?;

        if self.0.is_empty() {
            return Ok(dir.to_string());
        }

        let prefix_segs: Vec<&str> = self.0.split('/').collect();
        let dir_segs: Vec<&str> = dir.split('/').collect();

        if dir_segs.len() >= prefix_segs.len() && dir_segs[..prefix_segs.len()] == prefix_segs[..] {
            if dir_segs.len() == prefix_segs.len() {
                return Err(PreviewError::InvalidPath(format!(
                    "路径只包含前缀本身: {}",
                    dir
                )));
            }
            return Ok(dir.to_string());
        }

        if dir_segs[0] == prefix_segs[0] {
            return Err(PreviewError::AmbiguousPrefix {
                path: dir.to_string(),
                prefix: self.0.clone(),
            });
        }

        Ok(format!("{}/{}", self.0, dir))
    }
}

/// 拆分入口文件：路径最后一段是 HTML 文件时，返回 (目录, Some(文件名))
pub fn split_entry(path: &str) -> (String, Option<String>) {
    match path.rsplit_once('/') {
        Some((dir, file)) if is_html_file_name(file) => (dir.to_string(), Some(file.to_string())),
        None if is_html_file_name(path) => (String::new(), Some(path.to_string())),
        _ => (path.to_string(), None),
    }
}

/// 规范化调用方显式指定的入口文件
pub fn normalize_entry_file(raw: &str) -> Result<String, PreviewError> {
    let entry = trim_slashes(raw.trim());
    validate_key(entry)?;
    Ok(entry.to_string())
}

/// 把会话内请求的相对路径解析成完整存储 key
pub fn resolve_asset(base_dir: &str, requested: &str) -> Result<String, PreviewError> {
    let requested = requested.trim_start_matches('/');
    validate_key(requested)?;
    Ok(join_key(base_dir, requested))
}
