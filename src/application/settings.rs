//! 预览服务设置
//!
//! 由配置层构造，描述会话 ID、URL 与存储前缀的生成方式

use url::Url;

use crate::domain::preview::{trim_slashes, BucketPrefix, SessionId, DEFAULT_SESSION_ID_PREFIX};

#[derive(Debug, Clone)]
pub struct PreviewSettings {
    /// 对外访问的 Base URL，用于拼接 previewUrl
    pub public_base_url: String,
    /// 预览路由挂载路径（不含首尾斜杠，空表示根路径）
    pub mount_path: String,
    /// 生成站点所在的 bucket 命名空间
    pub bucket_prefix: BucketPrefix,
    pub default_entry_file: String,
    pub session_id_prefix: String,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:5200".to_string(),
            mount_path: String::new(),
            bucket_prefix: BucketPrefix::new("codingpt/execute"),
            default_entry_file: "index.html".to_string(),
            session_id_prefix: DEFAULT_SESSION_ID_PREFIX.to_string(),
        }
    }
}

impl PreviewSettings {
    pub fn with_mount_path(mut self, mount_path: impl AsRef<str>) -> Self {
        self.mount_path = trim_slashes(mount_path.as_ref()).to_string();
        self
    }

    /// 路由前缀，形如 `/api/executor`；根路径挂载时为空
    pub fn route_prefix(&self) -> String {
        if self.mount_path.is_empty() {
            String::new()
        } else {
            format!("/{}", self.mount_path)
        }
    }

    /// 注入到 HTML 中的 base href
    pub fn session_base_href(&self, id: &SessionId) -> String {
        format!("{}/{}/", self.route_prefix(), id)
    }

    /// 浏览器端 beacon 调用的过期接口路径
    pub fn expire_path(&self, id: &SessionId) -> String {
        format!("{}/{}/expire", self.route_prefix(), id)
    }

    /// 返回给调用方的预览链接，路径逐段百分号编码
    pub fn preview_url(&self, id: &SessionId, entry_file: &str) -> String {
        let segments = self
            .mount_path
            .split('/')
            .chain(std::iter::once(id.as_str()))
            .chain(entry_file.split('/'))
            .filter(|seg| !seg.is_empty());

        format!(
            "{}{}",
            self.public_base_url.trim_end_matches('/'),
            encode_path(segments)
        )
    }

    /// 路径段是否属于预览会话路由；不属于时按普通 404 处理
    pub fn owns_session_route(&self, raw: &str) -> bool {
        raw.starts_with(&self.session_id_prefix)
    }
}

fn encode_path<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    let segments: Vec<&str> = segments.collect();
    match Url::parse("http://localhost/") {
        Ok(mut url) => {
            if let Ok(mut path) = url.path_segments_mut() {
                path.clear().extend(&segments);
            }
            url.path().to_string()
        }
        Err(_) => format!("/{}", segments.join("/")),
    }
}
