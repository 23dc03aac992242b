//! Preview Query Handlers

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::error::ApplicationError;
use crate::application::ports::{ObjectStoragePort, SessionRegistryPort, StorageError};
use crate::application::queries::preview_queries::{ServePreviewFileQuery, ServePreviewFileResponse};
use crate::application::settings::PreviewSettings;
use crate::domain::preview::{resolve_asset, SessionId};
use crate::domain::{content_type_for, html_content_type, inject_preview_markup, is_html_path};

/// ServePreviewFile Handler - 会话内文件代理与 HTML 改写
pub struct ServePreviewFileHandler {
    storage: Arc<dyn ObjectStoragePort>,
    registry: Arc<dyn SessionRegistryPort>,
    settings: Arc<PreviewSettings>,
}

impl ServePreviewFileHandler {
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
        query: ServePreviewFileQuery,
    ) -> Result<ServePreviewFileResponse, ApplicationError> {
        self.handle_at(query, Utc::now()).await
    }

    /// 过期判断只在请求入口进行，读取过程中过期不影响本次响应
    pub async fn handle_at(
        &self,
        query: ServePreviewFileQuery,
        now: DateTime<Utc>,
    ) -> Result<ServePreviewFileResponse, ApplicationError> {
        let id = SessionId::parse(&self.settings.session_id_prefix, &query.session_id)?;

        let session = self
            .registry
            .get(&id)
            .ok_or_else(|| ApplicationError::SessionNotFound(id.to_string()))?;

        if session.is_expired_at(now) {
            self.registry.evict(&id);
            tracing::info!(session_id = %id, "Preview session expired on access");
            return Err(ApplicationError::SessionExpired(id.to_string()));
        }

        let requested = query
            .sub_path
            .as_deref()
            .map(|p| p.trim_start_matches('/'))
            .filter(|p| !p.is_empty())
            .unwrap_or(&session.entry_file)
            .to_string();

        let resolved_path = resolve_asset(&session.base_dir, &requested).map_err(|_| {
            ApplicationError::FileNotFound {
                requested_file: requested.clone(),
                resolved_path: format!("{}/{}", session.base_dir, requested),
            }
        })?;

        let object = match self.storage.get_object(&resolved_path).await {
            Ok(object) => object,
            Err(StorageError::NotFound(_)) | Err(StorageError::InvalidKey(_)) => {
                tracing::warn!(
                    session_id = %id,
                    requested_file = %requested,
                    resolved_path = %resolved_path,
                    "Preview file not found"
                );
                return Err(ApplicationError::FileNotFound {
                    requested_file: requested,
                    resolved_path,
                });
            }
            Err(e) => {
                tracing::error!(session_id = %id, resolved_path = %resolved_path, error = %e, "Storage fetch failed");
                return Err(e.into());
            }
        };

        if !is_html_path(&requested) {
            return Ok(ServePreviewFileResponse {
                content_type: content_type_for(&requested, object.content_type.as_deref()),
                body: object.bytes,
                rewritten: false,
                resolved_path,
            });
        }

        self.registry.touch_at(&id, now);

        let content_type = html_content_type(object.content_type.as_deref(), &object.bytes);
        let rewritten = inject_preview_markup(
            &object.bytes,
            &self.settings.session_base_href(&id),
            &self.settings.expire_path(&id),
        );

        tracing::debug!(session_id = %id, resolved_path = %resolved_path, "Serving rewritten HTML");

        Ok(ServePreviewFileResponse {
            body: rewritten,
            content_type,
            rewritten: true,
            resolved_path,
        })
    }
}
