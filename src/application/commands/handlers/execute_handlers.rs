//! Execute Command Handlers

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::commands::execute_commands::ExecuteCodeCommand;
use crate::application::error::ApplicationError;
use crate::application::ports::{CodeRunnerPort, ExecutionEvent, Language};

/// ExecuteCode Handler - 校验请求并启动代码执行
pub struct ExecuteCodeHandler {
    runner: Arc<dyn CodeRunnerPort>,
}

impl ExecuteCodeHandler {
    pub fn new(runner: Arc<dyn CodeRunnerPort>) -> Self {
        Self { runner }
    }

    pub async fn handle(
        &self,
        cmd: ExecuteCodeCommand,
    ) -> Result<mpsc::Receiver<ExecutionEvent>, ApplicationError> {
        if cmd.code.trim().is_empty() {
            return Err(ApplicationError::validation("code is required"));
        }

        let language = Language::parse(&cmd.language).ok_or_else(|| {
            ApplicationError::validation(format!("Unsupported language: {}", cmd.language))
        })?;

        tracing::info!(
            language = language.display_name(),
            code_len = cmd.code.len(),
            "Code execution requested"
        );

        self.runner
            .run(language, cmd.code)
            .await
            .map_err(|e| ApplicationError::internal(e.to_string()))
    }
}
