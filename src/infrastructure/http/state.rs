//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CreatePreviewHandler, ExecuteCodeHandler, ExpirePreviewHandler,
    // Query handlers
    ServePreviewFileHandler,
    // Ports
    CodeRunnerPort, ObjectStoragePort, SessionRegistryPort,
    // Settings
    PreviewSettings,
};

/// 应用状态
pub struct AppState {
    pub settings: Arc<PreviewSettings>,

    // ========== Ports ==========
    pub registry: Arc<dyn SessionRegistryPort>,

    // ========== Command Handlers ==========
    pub create_preview_handler: CreatePreviewHandler,
    pub expire_preview_handler: ExpirePreviewHandler,
    /// 未启用代码执行时为 None
    pub execute_code_handler: Option<ExecuteCodeHandler>,

    // ========== Query Handlers ==========
    pub serve_preview_handler: ServePreviewFileHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        settings: PreviewSettings,
        storage: Arc<dyn ObjectStoragePort>,
        registry: Arc<dyn SessionRegistryPort>,
        runner: Option<Arc<dyn CodeRunnerPort>>,
    ) -> Self {
        let settings = Arc::new(settings);
        Self {
            settings: settings.clone(),
            registry: registry.clone(),

            // Command handlers
            create_preview_handler: CreatePreviewHandler::new(
                storage.clone(),
                registry.clone(),
                settings.clone(),
            ),
            expire_preview_handler: ExpirePreviewHandler::new(registry.clone(), settings.clone()),
            execute_code_handler: runner.map(ExecuteCodeHandler::new),

            // Query handlers
            serve_preview_handler: ServePreviewFileHandler::new(storage, registry, settings),
        }
    }
}
