//! Process Code Runner - 以子进程执行代码
//!
//! 实现 CodeRunnerPort trait
//!
//! 代码写入 `work_dir` 下的临时文件后交给解释器执行，stdout/stderr 按行转发为事件。
//! 只做环境变量清理与超时控制，不做沙箱隔离。

use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::application::ports::{CodeRunnerPort, ExecutionEvent, Language, RunnerError};

/// 事件通道容量
const EVENT_BUFFER: usize = 256;

/// 执行器配置
#[derive(Debug, Clone)]
pub struct ProcessRunnerConfig {
    /// 单次执行超时（秒）
    pub timeout_secs: u64,
    /// 临时文件目录，同时作为子进程工作目录
    pub work_dir: PathBuf,
}

impl Default for ProcessRunnerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            work_dir: std::env::temp_dir().join("code-execute"),
        }
    }
}

/// 子进程代码执行器
pub struct ProcessCodeRunner {
    config: ProcessRunnerConfig,
}

impl ProcessCodeRunner {
    pub fn new(config: ProcessRunnerConfig) -> Self {
        Self { config }
    }

    fn temp_file(&self, language: Language) -> PathBuf {
        self.config.work_dir.join(format!(
            "code-{}-{}.{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            language.extension()
        ))
    }
}

#[async_trait]
impl CodeRunnerPort for ProcessCodeRunner {
    async fn run(
        &self,
        language: Language,
        code: String,
    ) -> Result<mpsc::Receiver<ExecutionEvent>, RunnerError> {
        fs::create_dir_all(&self.config.work_dir)
            .await
            .map_err(|e| RunnerError::IoError(e.to_string()))?;

        let file = self.temp_file(language);
        fs::write(&file, code)
            .await
            .map_err(|e| RunnerError::IoError(e.to_string()))?;

        let child = match spawn_interpreter(language, &file, &self.config.work_dir) {
            Ok(child) => child,
            Err(e) => {
                remove_temp_file(&file).await;
                return Err(RunnerError::IoError(format!(
                    "failed to start {} interpreter: {}",
                    language.display_name(),
                    e
                )));
            }
        };

        tracing::info!(
            language = language.display_name(),
            file = %file.display(),
            pid = child.id().unwrap_or(0),
            "Code process spawned"
        );

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let timeout = Duration::from_secs(self.config.timeout_secs);
        tokio::spawn(supervise(child, file, language, timeout, tx));
        Ok(rx)
    }
}

/// 按候选顺序启动解释器，只有 NotFound 时才尝试下一个
fn spawn_interpreter(language: Language, file: &Path, work_dir: &Path) -> std::io::Result<Child> {
    let mut last_err = None;

    for program in language.interpreters() {
        let mut command = Command::new(program);
        command
            .arg(file)
            .current_dir(work_dir)
            .env_clear()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(path) = std::env::var_os("PATH") {
            command.env("PATH", path);
        }

        match command.spawn() {
            Ok(child) => return Ok(child),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(program = %program, "Interpreter not found, trying next");
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| std::io::Error::new(ErrorKind::NotFound, "no interpreter")))
}

async fn supervise(
    mut child: Child,
    file: PathBuf,
    language: Language,
    timeout: Duration,
    tx: mpsc::Sender<ExecutionEvent>,
) {
    let _ = tx
        .send(ExecutionEvent::Log {
            message: format!("Running {} code...\n", language.display_name()),
        })
        .await;

    let stdout = child
        .stdout
        .take()
        .map(|out| tokio::spawn(forward_lines(out, tx.clone(), false)));
    let stderr = child
        .stderr
        .take()
        .map(|err| tokio::spawn(forward_lines(err, tx.clone(), true)));

    let close = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let saw_stderr = join_forwarder(stderr).await;
            join_forwarder(stdout).await;
            let exit_code = status.code().unwrap_or(-1);
            let _ = tx
                .send(ExecutionEvent::Log {
                    message: format!("Process exited (exit code: {})\n", exit_code),
                })
                .await;
            ExecutionEvent::Close {
                exit_code,
                has_error: saw_stderr || exit_code != 0,
                message: None,
            }
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Failed to wait for code process");
            let _ = tx
                .send(ExecutionEvent::Error {
                    data: format!("{}\n", e),
                })
                .await;
            ExecutionEvent::Close {
                exit_code: -1,
                has_error: true,
                message: Some("Process failed".to_string()),
            }
        }
        Err(_) => {
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "Failed to kill timed out process");
            }
            join_forwarder(stderr).await;
            join_forwarder(stdout).await;
            tracing::warn!(timeout_secs = timeout.as_secs(), "Code execution timed out");
            let _ = tx
                .send(ExecutionEvent::Error {
                    data: format!(
                        "\nExecution exceeded {} seconds and was terminated.\n",
                        timeout.as_secs()
                    ),
                })
                .await;
            ExecutionEvent::Close {
                exit_code: -1,
                has_error: true,
                message: Some("Execution timed out".to_string()),
            }
        }
    };

    let _ = tx.send(close).await;
    remove_temp_file(&file).await;
}

/// 逐行转发输出，返回是否收到过内容
///
/// 非 UTF-8 字节按替换字符解码，管道始终读到 EOF
async fn forward_lines<R>(reader: R, tx: mpsc::Sender<ExecutionEvent>, is_stderr: bool) -> bool
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut seen = false;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, is_stderr, "Failed to read child output");
                break;
            }
        }
        seen = true;

        let line = buf
            .strip_suffix(b"\n")
            .map(|l| l.strip_suffix(b"\r").unwrap_or(l))
            .unwrap_or(&buf[..]);
        let data = format!("{}\n", String::from_utf8_lossy(line));
        let event = if is_stderr {
            ExecutionEvent::Error { data }
        } else {
            ExecutionEvent::Output { data }
        };
        // 接收端已断开时继续读完管道，避免子进程阻塞在写入上
        let _ = tx.send(event).await;
    }
    seen
}

async fn join_forwarder(handle: Option<JoinHandle<bool>>) -> bool {
    match handle {
        Some(handle) => handle.await.unwrap_or(false),
        None => false,
    }
}

async fn remove_temp_file(file: &Path) {
    if let Err(e) = fs::remove_file(file).await {
        if e.kind() != ErrorKind::NotFound {
            tracing::warn!(file = %file.display(), error = %e, "Failed to remove temp file");
        }
    }
}
