//! Tool seam: what the model may ask the agent to run on its behalf.
//!
//! The model never sees Rust types: it sees the catalog rendered from
//! [`ToolDescriptor`]s inside the system prompt, and it answers with a JSON
//! object that the agent turns into a [`ToolInvocation`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The advertised contract of one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name (e.g., "read-entry")
    pub name: String,

    /// What the tool does (sent to the model)
    pub description: String,

    /// Declared parameter names, in documentation order
    pub parameter_names: Vec<String>,
}

impl ToolDescriptor {
    /// One catalog line: `- name(param, ...): description`.
    pub fn render(&self) -> String {
        format!(
            "- {}({}): {}",
            self.name,
            self.parameter_names.join(", "),
            self.description
        )
    }
}

/// Render a full tool catalog, one tool per line.
pub fn render_catalog(descriptors: &[ToolDescriptor]) -> String {
    descriptors
        .iter()
        .map(ToolDescriptor::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Marker appended to any output cut short by [`truncate_output`].
pub const TRUNCATION_MARKER: &str = "[truncated]";

/// Cut `text` to at most `max_chars` characters, appending an explicit
/// truncation marker when anything was dropped.
pub fn truncate_output(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => {
            let total = text.chars().count();
            format!("{}\n...{TRUNCATION_MARKER} (showing {max_chars} of {total} characters)", &text[..cut])
        }
    }
}

/// A parsed request to run a tool. Lives for a single loop iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Name of the tool to execute
    pub name: String,

    /// Parameters, all string-typed
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    /// Builder-style parameter insertion.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Look up a parameter, treating blank values as absent.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// The Tool Provider boundary.
///
/// `execute` is infallible by contract: unknown tools, bad arguments and
/// failed operations all come back as descriptive text so the model can
/// adapt on its next turn.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// The tool catalog, in a stable order.
    fn descriptors(&self) -> Vec<ToolDescriptor>;

    /// Run a tool and return its textual output (or an error string).
    async fn execute(&self, invocation: &ToolInvocation) -> String;
}
