//! Code Runner Port - 代码执行
//!
//! 以事件流形式返回子进程输出，具体实现在 infrastructure/adapters/executor

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("IO error: {0}")]
    IoError(String),
}

/// 支持的语言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    Python,
}

impl Language {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" | "node" => Some(Self::JavaScript),
            "python" | "py" => Some(Self::Python),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::JavaScript => "JavaScript",
            Self::Python => "Python",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::JavaScript => "js",
            Self::Python => "py",
        }
    }

    /// 解释器候选，按顺序尝试，前一个不存在时回退到下一个
    pub fn interpreters(&self) -> &'static [&'static str] {
        match self {
            Self::JavaScript => &["node"],
            Self::Python => &["python3", "python"],
        }
    }
}

/// 执行过程事件，序列化后作为 SSE `data` 发送
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExecutionEvent {
    Log {
        message: String,
    },
    Output {
        data: String,
    },
    Error {
        data: String,
    },
    Close {
        #[serde(rename = "exitCode")]
        exit_code: i32,
        #[serde(rename = "hasError")]
        has_error: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

/// Code Runner Port
#[async_trait]
pub trait CodeRunnerPort: Send + Sync {
    /// 启动执行，返回事件接收端；最后一个事件总是 `Close`
    async fn run(
        &self,
        language: Language,
        code: String,
    ) -> Result<mpsc::Receiver<ExecutionEvent>, RunnerError>;
}
