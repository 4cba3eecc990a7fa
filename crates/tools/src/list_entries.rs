//! Directory listing tool: one level, sandboxed.

use crate::{sandbox_error, BuiltinTool};
use repochat_core::error::ToolError;
use repochat_core::tool::ToolInvocation;
use repochat_security::resolve_in_sandbox;
use std::path::PathBuf;

pub struct ListEntriesTool {
    root: PathBuf,
}

impl ListEntriesTool {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub async fn run(&self, call: &ToolInvocation) -> Result<String, ToolError> {
        let requested = call.param("path").unwrap_or(".");
        let dir = resolve_in_sandbox(&self.root, requested)
            .map_err(|e| sandbox_error(BuiltinTool::ListEntries, e))?;

        if !dir.exists() {
            return Err(ToolError::PathNotFound(requested.into()));
        }
        if !dir.is_dir() {
            return Err(ToolError::NotADirectory(requested.into()));
        }

        let io_error = |e: std::io::Error| ToolError::ExecutionFailed {
            tool_name: BuiltinTool::ListEntries.name().into(),
            reason: e.to_string(),
        };

        let mut read_dir = tokio::fs::read_dir(&dir).await.map_err(io_error)?;
        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(io_error)? {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
        }

        if entries.is_empty() {
            return Ok("Empty directory".into());
        }

        entries.sort();
        Ok(entries
            .into_iter()
            .map(|(name, is_dir)| {
                let kind = if is_dir { "[DIR]" } else { "[FILE]" };
                format!("{kind} {name}")
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
