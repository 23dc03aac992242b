//! Preview Command Handlers

use std::sync::Arc;

use crate::application::commands::preview_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{EntryKind, ObjectStoragePort, SessionRegistryPort};
use crate::application::settings::PreviewSettings;
use crate::domain::preview::{is_html_file_name, join_key, normalize_entry_file, split_entry, SessionId};

/// CreatePreview Handler - 为存储目录创建预览会话
pub struct CreatePreviewHandler {
    storage: Arc<dyn ObjectStoragePort>,
    registry: Arc<dyn SessionRegistryPort>,
    settings: Arc<PreviewSettings>,
}

impl CreatePreviewHandler {
    pub fn new(
        storage: Arc<dyn ObjectStoragePort>,
        registry: Arc<dyn SessionRegistryPort>,
        settings: Arc<PreviewSettings>,
    ) -> Self {
        Self {
            storage,
            registry,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePreviewCommand,
    ) -> Result<CreatePreviewResponse, ApplicationError> {
        let raw = cmd.s3_path.trim();
        if raw.is_empty() {
            return Err(ApplicationError::validation("s3Path is required"));
        }

        let full_path = self.settings.bucket_prefix.apply(raw)?;
        let explicit = cmd
            .file_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        // (目录, 入口文件, 是否已确认存在)
        let (base_dir, entry_file, confirmed) = match explicit {
            Some(name) => (full_path, normalize_entry_file(name)?, false),
            None => match split_entry(&full_path) {
                (dir, Some(file)) => (dir, file, false),
                (dir, None) => {
                    let entry = self.detect_entry(&dir).await?;
                    (dir, entry, true)
                }
            },
        };

        let storage_path = join_key(&base_dir, &entry_file);
        if !confirmed && !self.storage.exists(&storage_path).await? {
            return Err(ApplicationError::not_found("Entry file", storage_path));
        }

        let session = self.registry.create(&base_dir, &entry_file);
        let preview_url = self.settings.preview_url(&session.id, &session.entry_file);
        let expires_in = (session.expires_at - session.created_at).num_seconds().max(0) as u64;

        tracing::info!(
            session_id = %session.id,
            storage_path = %session.storage_path,
            "Preview session created"
        );

        Ok(CreatePreviewResponse {
            session_id: session.id.to_string(),
            preview_url,
            storage_path: session.storage_path,
            expires_in,
        })
    }

    /// 入口文件探测：优先默认入口，其次目录下第一个 HTML 文件
    async fn detect_entry(&self, dir: &str) -> Result<String, ApplicationError> {
        let default_entry = &self.settings.default_entry_file;
        if self.storage.exists(&join_key(dir, default_entry)).await? {
            return Ok(default_entry.clone());
        }

        let entries = self.storage.list_prefix(dir).await?;
        tracing::debug!(dir = %dir, count = entries.len(), "Default entry missing, scanning directory");

        entries
            .into_iter()
            .find(|entry| entry.kind == EntryKind::File && is_html_file_name(&entry.name))
            .map(|entry| entry.name)
            .ok_or_else(|| ApplicationError::NoViewableEntry(dir.to_string()))
    }
}

/// ExpirePreview Handler - 删除会话，重复调用安全
pub struct ExpirePreviewHandler {
    registry: Arc<dyn SessionRegistryPort>,
    settings: Arc<PreviewSettings>,
}

impl ExpirePreviewHandler {
    pub fn new(registry: Arc<dyn SessionRegistryPort>, settings: Arc<PreviewSettings>) -> Self {
        Self { registry, settings }
    }

    pub fn handle(&self, cmd: ExpirePreviewCommand) -> Result<ExpirePreviewResponse, ApplicationError> {
        if !self.settings.owns_session_route(&cmd.session_id) {
            return Err(ApplicationError::SessionNotFound(cmd.session_id));
        }

        let expired = match SessionId::parse(&self.settings.session_id_prefix, &cmd.session_id) {
            Ok(id) => self.registry.evict(&id),
            Err(_) => false,
        };

        if expired {
            tracing::info!(session_id = %cmd.session_id, "Preview session expired by client");
        } else {
            tracing::debug!(session_id = %cmd.session_id, "Expire requested for unknown session");
        }

        Ok(ExpirePreviewResponse {
            session_id: cmd.session_id,
            expired,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::storage::InMemoryObjectStorage;
    use crate::infrastructure::memory::{InMemorySessionRegistry, RegistryConfig};

    struct Fixture {
        storage: Arc<InMemoryObjectStorage>,
        registry: Arc<InMemorySessionRegistry>,
        create: CreatePreviewHandler,
        expire: ExpirePreviewHandler,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(InMemoryObjectStorage::new());
        let registry = Arc::new(InMemorySessionRegistry::new(RegistryConfig::default()));
        let settings = Arc::new(PreviewSettings::default());
        Fixture {
            create: CreatePreviewHandler::new(storage.clone(), registry.clone(), settings.clone()),
            expire: ExpirePreviewHandler::new(registry.clone(), settings),
            storage,
            registry,
        }
    }

    fn cmd(s3_path: &str, file_name: Option<&str>) -> CreatePreviewCommand {
        CreatePreviewCommand {
            s3_path: s3_path.to_string(),
            file_name: file_name.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_with_index_html() {
        let f = fixture();
        f.storage.put("codingpt/execute/demo/site/index.html", "<html></html>", None);

        let resp = f.create.handle(cmd("/demo/site/", None)).await.unwrap();

        assert!(resp.session_id.starts_with("preview-"));
        assert_eq!(resp.storage_path, "codingpt/execute/demo/site/index.html");
        assert_eq!(resp.expires_in, 300);
        assert_eq!(
            resp.preview_url,
            format!("http://localhost:5200/{}/index.html", resp.session_id)
        );
        assert_eq!(
            f.registry.session_for_path(&resp.storage_path).map(|id| id.to_string()),
            Some(resp.session_id)
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_first_html_file() {
        let f = fixture();
        f.storage.put("codingpt/execute/demo/app.js", "1", None);
        f.storage.put("codingpt/execute/demo/page.htm", "<p></p>", None);
        f.storage.put("codingpt/execute/demo/zeta.html", "<p></p>", None);

        let resp = f.create.handle(cmd("demo", None)).await.unwrap();
        assert_eq!(resp.storage_path, "codingpt/execute/demo/page.htm");
    }

    #[tokio::test]
    async fn test_no_viewable_entry() {
        let f = fixture();
        f.storage.put("codingpt/execute/demo/empty/readme.txt", "x", None);

        let err = f.create.handle(cmd("demo/empty", None)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NoViewableEntry(_)));
        assert!(f.registry.is_empty());
    }

    #[tokio::test]
    async fn test_explicit_entry_must_exist() {
        let f = fixture();
        f.storage.put("codingpt/execute/demo/index.html", "<p></p>", None);

        let err = f.create.handle(cmd("demo", Some("about.html"))).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));

        f.storage.put("codingpt/execute/demo/about.html", "<p></p>", None);
        let resp = f.create.handle(cmd("demo", Some("about.html"))).await.unwrap();
        assert!(resp.preview_url.ends_with("/about.html"));
    }

    #[tokio::test]
    async fn test_file_path_is_split_into_dir_and_entry() {
        let f = fixture();
        f.storage.put("codingpt/execute/demo/main.html", "<p></p>", None);

        let resp = f.create.handle(cmd("demo/main.html", None)).await.unwrap();
        let id = SessionId::parse("preview-", &resp.session_id).unwrap();
        let session = f.registry.get(&id).unwrap();
        assert_eq!(session.base_dir, "codingpt/execute/demo");
        assert_eq!(session.entry_file, "main.html");
    }

    #[tokio::test]
    async fn test_missing_and_invalid_paths() {
        let f = fixture();
        assert!(matches!(
            f.create.handle(cmd("  ", None)).await.unwrap_err(),
            ApplicationError::ValidationError(_)
        ));
        assert!(matches!(
            f.create.handle(cmd("demo/../secret", None)).await.unwrap_err(),
            ApplicationError::InvalidPath(_)
        ));
        assert!(matches!(
            f.create.handle(cmd("codingpt/other", None)).await.unwrap_err(),
            ApplicationError::InvalidPath(_)
        ));
    }

    #[tokio::test]
    async fn test_storage_failure_is_surfaced() {
        let f = fixture();
        f.storage.set_unavailable(true);

        let err = f.create.handle(cmd("demo", None)).await.unwrap_err();
        match err {
            ApplicationError::StorageError(msg) => assert!(msg.contains("unavailable")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_create_supersedes_first() {
        let f = fixture();
        f.storage.put("codingpt/execute/demo/index.html", "<p></p>", None);

        let first = f.create.handle(cmd("demo", None)).await.unwrap();
        let second = f.create.handle(cmd("demo", None)).await.unwrap();

        assert_ne!(first.session_id, second.session_id);
        let first_id = SessionId::parse("preview-", &first.session_id).unwrap();
        assert!(f.registry.get(&first_id).is_none());
        assert_eq!(f.registry.len(), 1);
    }

    #[tokio::test]
    async fn test_expire_twice() {
        let f = fixture();
        f.storage.put("codingpt/execute/demo/index.html", "<p></p>", None);
        let created = f.create.handle(cmd("demo", None)).await.unwrap();

        let expire = || ExpirePreviewCommand {
            session_id: created.session_id.clone(),
        };
        assert!(f.expire.handle(expire()).unwrap().expired);
        assert!(!f.expire.handle(expire()).unwrap().expired);
    }

    #[test]
    fn test_expire_rejects_foreign_ids() {
        let f = fixture();
        let err = f
            .expire
            .handle(ExpirePreviewCommand {
                session_id: "health".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ApplicationError::SessionNotFound(_)));
    }
}
