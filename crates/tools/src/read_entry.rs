//! File read tool: read one file under the sandbox root, size-capped.

use crate::{sandbox_error, BuiltinTool};
use repochat_core::error::ToolError;
use repochat_core::tool::{truncate_output, ToolInvocation};
use repochat_security::resolve_in_sandbox;
use std::path::PathBuf;

pub const DEFAULT_MAX_CHARS: usize = 2000;

pub struct ReadEntryTool {
    root: PathBuf,
    pub(crate) max_chars: usize,
}

impl ReadEntryTool {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub async fn run(&self, call: &ToolInvocation) -> Result<String, ToolError> {
        let requested = call
            .param("path")
            .ok_or_else(|| ToolError::MissingParameter("path".into()))?;

        let file = resolve_in_sandbox(&self.root, requested)
            .map_err(|e| sandbox_error(BuiltinTool::ReadEntry, e))?;

        if !file.exists() {
            return Err(ToolError::PathNotFound(requested.into()));
        }
        if file.is_dir() {
            return Err(ToolError::IsADirectory(requested.into()));
        }

        let bytes = tokio::fs::read(&file)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: BuiltinTool::ReadEntry.name().into(),
                reason: e.to_string(),
            })?;

        Ok(truncate_output(&String::from_utf8_lossy(&bytes), self.max_chars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repochat_core::TRUNCATION_MARKER;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();
        dir
    }

    #[tokio::test]
    async fn reads_existing_file() {
        let dir = fixture();
        let tool = ReadEntryTool::new(dir.path().to_path_buf());
        let call = ToolInvocation::new("read-entry").with_param("path", "src/main.rs");
        assert_eq!(tool.run(&call).await.unwrap(), "fn main() {}\n");
    }

    #[tokio::test]
    async fn missing_parameter() {
        let dir = fixture();
        let tool = ReadEntryTool::new(dir.path().to_path_buf());
        let err = tool.run(&ToolInvocation::new("read-entry")).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingParameter(_)));
    }

    #[tokio::test]
    async fn missing_file() {
        let dir = fixture();
        let tool = ReadEntryTool::new(dir.path().to_path_buf());
        let call = ToolInvocation::new("read-entry").with_param("path", "missing.txt");
        let err = tool.run(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::PathNotFound(_)));
    }

    #[tokio::test]
    async fn directory_is_rejected() {
        let dir = fixture();
        let tool = ReadEntryTool::new(dir.path().to_path_buf());
        let call = ToolInvocation::new("read-entry").with_param("path", "src");
        let err = tool.run(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::IsADirectory(_)));
    }

    #[tokio::test]
    async fn error_kinds_read_differently() {
        let dir = fixture();
        let tool = ReadEntryTool::new(dir.path().to_path_buf());
        let missing_param = tool.run(&ToolInvocation::new("read-entry")).await.unwrap_err();
        let missing_file = tool
            .run(&ToolInvocation::new("read-entry").with_param("path", "x.txt"))
            .await
            .unwrap_err();
        let is_dir = tool
            .run(&ToolInvocation::new("read-entry").with_param("path", "src"))
            .await
            .unwrap_err();
        let texts = [missing_param.to_string(), missing_file.to_string(), is_dir.to_string()];
        assert_ne!(texts[0], texts[1]);
        assert_ne!(texts[1], texts[2]);
        assert_ne!(texts[0], texts[2]);
    }

    #[tokio::test]
    async fn long_file_is_truncated() {
        let dir = fixture();
        fs::write(dir.path().join("big.txt"), "a".repeat(DEFAULT_MAX_CHARS + 500)).unwrap();
        let tool = ReadEntryTool::new(dir.path().to_path_buf());
        let call = ToolInvocation::new("read-entry").with_param("path", "big.txt");
        let output = tool.run(&call).await.unwrap();
        assert!(output.contains(TRUNCATION_MARKER));
        assert!(output.starts_with(&"a".repeat(DEFAULT_MAX_CHARS)));
    }

    #[tokio::test]
    async fn binary_content_decoded_lossily() {
        let dir = fixture();
        fs::write(dir.path().join("blob.bin"), [0x66, 0x6f, 0xff, 0x6f]).unwrap();
        let tool = ReadEntryTool::new(dir.path().to_path_buf());
        let call = ToolInvocation::new("read-entry").with_param("path", "blob.bin");
        let output = tool.run(&call).await.unwrap();
        assert!(output.starts_with("fo"));
    }

    #[tokio::test]
    async fn escaping_path_rejected() {
        let dir = fixture();
        let tool = ReadEntryTool::new(dir.path().to_path_buf());
        let call = ToolInvocation::new("read-entry").with_param("path", "/etc/passwd");
        let err = tool.run(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation(_)));
    }
}
