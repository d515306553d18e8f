//! Command backend: runs a local program per call
//!
//! The call parameters are written to the child's stdin as JSON. Stdout is
//! parsed as JSON when possible and returned as a string otherwise.
//!
//! | Situation | Result |
//! |-----------|--------|
//! | program cannot be spawned | `BackendError::Connection` |
//! | non-zero exit status | `BackendError::Execution` (stderr excerpt) |
//! | stdout over 1 MB | `BackendError::Execution` |
//! | cancellation fires | child is killed, `BackendError::Cancelled` |

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use toolgate_application::{BackendError, ToolBackend};
use toolgate_domain::util::truncate_detail;
use tracing::debug;

/// Maximum output size (1 MB)
const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Stderr excerpt included in execution errors (bytes)
const STDERR_EXCERPT: usize = 512;

#[derive(Debug, Clone)]
pub struct CommandToolBackend {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandToolBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    async fn run(&self, params: &Value) -> Result<Value, BackendError> {
        let input = serde_json::to_vec(params)
            .map_err(|e| BackendError::Misconfigured(format!("unserializable params: {}", e)))?;

        let mut child = self.command().spawn().map_err(|e| {
            BackendError::Connection(format!("failed to spawn {}: {}", self.program, e))
        })?;

        // Stdin must be fed while stdout is drained; filters block otherwise
        let stdin = child.stdin.take();
        let program = &self.program;
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // Programs that ignore stdin may exit before reading it
                if let Err(e) = stdin.write_all(&input).await {
                    debug!(program = %program, error = %e, "Could not write params to stdin");
                }
            }
        };
        let ((), output) = tokio::join!(feed, child.wait_with_output());
        let output = output
            .map_err(|e| BackendError::Execution(format!("failed to wait for {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt = truncate_detail(stderr.trim(), STDERR_EXCERPT);
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(BackendError::Execution(format!(
                "{} exited with {}: {}",
                self.program, code, excerpt
            )));
        }

        if output.stdout.len() > MAX_OUTPUT_SIZE {
            return Err(BackendError::Execution(format!(
                "output too large: {} bytes (max: {} bytes)",
                output.stdout.len(),
                MAX_OUTPUT_SIZE
            )));
        }

        Ok(parse_output(&output.stdout))
    }
}

fn parse_output(stdout: &[u8]) -> Value {
    let text = String::from_utf8_lossy(stdout);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

#[async_trait]
impl ToolBackend for CommandToolBackend {
    fn label(&self) -> String {
        format!("command:{}", self.program)
    }

    async fn invoke(
        &self,
        params: &Value,
        cancellation: CancellationToken,
    ) -> Result<Value, BackendError> {
        tokio::select! {
            _ = cancellation.cancelled() => Err(BackendError::Cancelled),
            result = self.run(params) => result,
        }
    }

    /// The program must still resolve on PATH (or as a path)
    async fn ping(&self) -> Result<(), BackendError> {
        which::which(&self.program)
            .map(|_| ())
            .map_err(|e| BackendError::Connection(format!("{}: {}", self.program, e)))
    }
}
