//! Built-in tool implementations for repochat.
//!
//! The tool set is closed: [`BuiltinTool`] names every tool the model may
//! call, and [`ToolRegistry`] dispatches on it with a plain `match`. Adding a
//! tool means adding a variant and a module, not registering a plugin.
//!
//! Every tool is read-only and confined to one sandbox root.

pub mod history_log;
pub mod list_entries;
pub mod read_entry;

use async_trait::async_trait;
use repochat_core::error::ToolError;
use repochat_core::tool::{ToolDescriptor, ToolInvocation, ToolProvider};
use repochat_security::PathValidationError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub use history_log::HistoryLogTool;
pub use list_entries::ListEntriesTool;
pub use read_entry::ReadEntryTool;

/// The closed set of tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTool {
    /// Recent commits of the repository at the sandbox root
    HistoryLog,
    /// One directory level under the sandbox root
    ListEntries,
    /// Contents of one file under the sandbox root
    ReadEntry,
}

impl BuiltinTool {
    /// Catalog order.
    pub const ALL: [BuiltinTool; 3] = [
        BuiltinTool::HistoryLog,
        BuiltinTool::ListEntries,
        BuiltinTool::ReadEntry,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinTool::HistoryLog => "history-log",
            BuiltinTool::ListEntries => "list-entries",
            BuiltinTool::ReadEntry => "read-entry",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BuiltinTool::HistoryLog => {
                "Get recent git commit history. Returns one line per commit: Hash | Author | Date | Message."
            }
            BuiltinTool::ListEntries => {
                "List files and directories at a path in the project (non-recursive). Defaults to the project root."
            }
            BuiltinTool::ReadEntry => "Read the content of a specific file. Use this to inspect code.",
        }
    }

    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            BuiltinTool::HistoryLog => &["limit"],
            BuiltinTool::ListEntries | BuiltinTool::ReadEntry => &["path"],
        }
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameter_names: self.parameter_names().iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Resolve a tool name as written by the model.
    ///
    /// Matching ignores case and treats `_` like `-`; the older names
    /// `git_log`, `list_files` and `read_file` are accepted as aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "history-log" | "git-log" => Some(BuiltinTool::HistoryLog),
            "list-entries" | "list-files" => Some(BuiltinTool::ListEntries),
            "read-entry" | "read-file" => Some(BuiltinTool::ReadEntry),
            _ => None,
        }
    }
}

/// Dispatches invocations to the built-in tools, all rooted at one directory.
pub struct ToolRegistry {
    root: PathBuf,
    history_log: HistoryLogTool,
    list_entries: ListEntriesTool,
    read_entry: ReadEntryTool,
}

impl ToolRegistry {
    /// Create a registry whose tools are confined to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            history_log: HistoryLogTool::new(root.clone()),
            list_entries: ListEntriesTool::new(root.clone()),
            read_entry: ReadEntryTool::new(root.clone()),
            root,
        }
    }

    /// Commits returned by `history-log` when the model gives no usable limit.
    pub fn with_default_log_limit(mut self, limit: u32) -> Self {
        self.history_log.default_limit = limit;
        self
    }

    /// How long `history-log` may wait on `git`.
    pub fn with_log_timeout(mut self, timeout: Duration) -> Self {
        self.history_log.timeout = timeout;
        self
    }

    /// Maximum characters `read-entry` returns.
    pub fn with_read_budget(mut self, max_chars: usize) -> Self {
        self.read_entry.max_chars = max_chars;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The tool catalog, in stable order.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        BuiltinTool::ALL.iter().map(BuiltinTool::descriptor).collect()
    }

    /// Run an invocation, keeping the typed error.
    pub async fn run(&self, invocation: &ToolInvocation) -> Result<String, ToolError> {
        let Some(tool) = BuiltinTool::from_name(&invocation.name) else {
            return Err(ToolError::UnknownTool(invocation.name.clone()));
        };

        info!(tool = tool.name(), params = ?invocation.params, "Executing tool");
        match tool {
            BuiltinTool::HistoryLog => self.history_log.run(invocation).await,
            BuiltinTool::ListEntries => self.list_entries.run(invocation).await,
            BuiltinTool::ReadEntry => self.read_entry.run(invocation).await,
        }
    }
}

#[async_trait]
impl ToolProvider for ToolRegistry {
    fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.list()
    }

    async fn execute(&self, invocation: &ToolInvocation) -> String {
        match self.run(invocation).await {
            Ok(output) => output,
            Err(e) => {
                debug!(tool = %invocation.name, error = %e, "Tool returned an error");
                format!("Error: {e}")
            }
        }
    }
}

/// Map a sandbox rejection onto the tool error the model will read.
pub(crate) fn sandbox_error(tool: BuiltinTool, err: PathValidationError) -> ToolError {
    match err {
        PathValidationError::OutsideSandbox { .. } => ToolError::SandboxViolation(err.to_string()),
        other => ToolError::ExecutionFailed {
            tool_name: tool.name().into(),
            reason: other.to_string(),
        },
    }
}
