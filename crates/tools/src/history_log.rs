//! History log tool: recent commits of the sandboxed repository.
//!
//! Shells out to `git log` with a fixed timeout. The tool fails soft: a
//! missing `git`, a directory that is not a repository, or a hung process
//! all come back as text for the model instead of stopping the loop.

use crate::BuiltinTool;
use repochat_core::error::ToolError;
use repochat_core::tool::ToolInvocation;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

pub const DEFAULT_LIMIT: u32 = 20;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const PRETTY_FORMAT: &str = "--pretty=format:%h | %an | %ad | %s";

pub struct HistoryLogTool {
    root: PathBuf,
    pub(crate) default_limit: u32,
    pub(crate) timeout: Duration,
    /// Executable given the `git log` arguments
    pub(crate) program: OsString,
}

impl HistoryLogTool {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            default_limit: DEFAULT_LIMIT,
            timeout: DEFAULT_TIMEOUT,
            program: OsString::from("git"),
        }
    }

    /// The `limit` parameter, or the default when it is absent, non-numeric or zero.
    fn limit(&self, call: &ToolInvocation) -> u32 {
        call.param("limit")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(self.default_limit)
    }

    pub async fn run(&self, call: &ToolInvocation) -> Result<String, ToolError> {
        let limit = self.limit(call);
        let tool_name = BuiltinTool::HistoryLog.name();
        debug!(limit, root = %self.root.display(), "Running git log");

        let mut child = Command::new(&self.program)
            .args(["log", PRETTY_FORMAT, "--date=short", "-n", &limit.to_string()])
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: tool_name.into(),
                reason: format!("could not start git: {e}"),
            })?;

        let (Some(mut stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(ToolError::ExecutionFailed {
                tool_name: tool_name.into(),
                reason: "git output was not captured".into(),
            });
        };

        let mut out = Vec::new();
        let mut err = Vec::new();
        let waited = tokio::time::timeout(self.timeout, async {
            let (read_out, read_err) =
                tokio::join!(stdout.read_to_end(&mut out), stderr.read_to_end(&mut err));
            read_out?;
            read_err?;
            child.wait().await
        })
        .await;

        match waited {
            Ok(Ok(status)) if status.success() => {
                let log = String::from_utf8_lossy(&out).trim_end().to_string();
                if log.is_empty() {
                    Ok("No commits found.".into())
                } else {
                    Ok(log)
                }
            }
            Ok(Ok(status)) => {
                let stderr = String::from_utf8_lossy(&err).trim().to_string();
                let reason = if stderr.is_empty() {
                    format!("git exited with {status}")
                } else {
                    stderr
                };
                Err(ToolError::ExecutionFailed {
                    tool_name: tool_name.into(),
                    reason,
                })
            }
            Ok(Err(e)) => Err(ToolError::ExecutionFailed {
                tool_name: tool_name.into(),
                reason: e.to_string(),
            }),
            Err(_) => {
                let _ = child.start_kill();
                let timeout_secs = self.timeout.as_secs();
                warn!(timeout_secs, collected = out.len(), "git log timed out");
                let partial = String::from_utf8_lossy(&out).trim_end().to_string();
                if partial.is_empty() {
                    Err(ToolError::Timeout {
                        tool_name: tool_name.into(),
                        timeout_secs,
                    })
                } else {
                    Ok(format!(
                        "{partial}\n[git log timed out after {:?}; output may be incomplete]",
                        self.timeout
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> HistoryLogTool {
        HistoryLogTool::new(PathBuf::from("."))
    }

    #[test]
    fn limit_defaults_when_absent() {
        assert_eq!(tool().limit(&ToolInvocation::new("history-log")), DEFAULT_LIMIT);
    }

    #[test]
    fn limit_parses_numbers() {
        let call = ToolInvocation::new("history-log").with_param("limit", "5");
        assert_eq!(tool().limit(&call), 5);
    }

    #[test]
    fn limit_defaults_when_not_numeric() {
        let call = ToolInvocation::new("history-log").with_param("limit", "five");
        assert_eq!(tool().limit(&call), DEFAULT_LIMIT);
        let call = ToolInvocation::new("history-log").with_param("limit", "0");
        assert_eq!(tool().limit(&call), DEFAULT_LIMIT);
    }

    #[tokio::test]
    async fn non_repository_fails_soft() {
        let dir = tempfile::tempdir().unwrap();
        let tool = HistoryLogTool::new(dir.path().to_path_buf());
        // Either git is missing or the directory is not a repository;
        // both must come back as an error value, never a panic.
        let result = tool.run(&ToolInvocation::new("history-log")).await;
        assert!(result.is_err());
    }

    /// A tool whose `git` is `sh`, so `sh log ...` runs the script named
    /// `log` inside the root.
    #[cfg(unix)]
    fn scripted(script: &str) -> (tempfile::TempDir, HistoryLogTool) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("log"), script).unwrap();
        let mut tool = HistoryLogTool::new(dir.path().to_path_buf());
        tool.program = OsString::from("sh");
        tool.timeout = Duration::from_millis(200);
        (dir, tool)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_keeps_partial_output() {
        let (_dir, tool) = scripted("echo 'abc123 | Dev | 2024-01-01 | First'\nexec sleep 5\n");
        let output = tool.run(&ToolInvocation::new("history-log")).await.unwrap();
        assert!(output.starts_with("abc123 | Dev | 2024-01-01 | First"));
        assert!(output.contains("timed out after 200ms"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_without_output_is_an_error() {
        let (_dir, tool) = scripted("exec sleep 5\n");
        let result = tool.run(&ToolInvocation::new("history-log")).await;
        assert!(matches!(result, Err(ToolError::Timeout { .. })), "{result:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn script_output_is_returned_as_the_log() {
        let (_dir, tool) = scripted("echo 'abc123 | Dev | 2024-01-01 | First'\n");
        let output = tool.run(&ToolInvocation::new("history-log")).await.unwrap();
        assert_eq!(output, "abc123 | Dev | 2024-01-01 | First");
    }

    #[tokio::test]
    async fn missing_root_fails_soft() {
        let tool = HistoryLogTool::new(PathBuf::from("/nonexistent/repochat/repo"));
        let result = tool.run(&ToolInvocation::new("history-log")).await;
        assert!(matches!(result, Err(ToolError::ExecutionFailed { .. })));
    }
}
