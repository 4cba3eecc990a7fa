//! Prompt text the loop puts into the history.

use repochat_core::tool::{render_catalog, ToolDescriptor};

/// Reply given when a turn runs out of tool calls under the `notice` policy.
pub const EXHAUSTION_NOTICE: &str =
    "I could not finish answering within the allowed number of tool calls. Please narrow the question and try again.";

/// Build the system prompt: the seed text followed by the tool catalog and
/// the calling convention.
pub fn build_system_prompt(seed: &str, tools: &[ToolDescriptor]) -> String {
    let seed = seed.trim();
    if tools.is_empty() {
        return seed.to_string();
    }

    format!(
        "{seed}\n\n\
         You can inspect the current repository with these read-only tools:\n\
         {catalog}\n\n\
         To call a tool, reply with ONLY a JSON object and nothing else:\n\
         {{\"tool\": \"<name>\", \"params\": {{\"<param>\": \"<value>\"}}}}\n\n\
         After a tool's output arrives, answer the user's question or call another tool. \
         When you can answer, reply in plain text without any JSON.",
        catalog = render_catalog(tools),
    )
}

/// The synthetic user message that carries a tool's output back to the model.
pub fn tool_result_message(tool_name: &str, output: &str) -> String {
    format!(
        "Output of tool '{tool_name}':\n{output}\n\n\
         Using this output, answer the user's question or call another tool."
    )
}

/// Instructions for the one-off summarization request made during compaction.
pub const SUMMARY_INSTRUCTIONS: &str = "You summarize conversations between a user and a coding assistant. \
     Write one concise paragraph that keeps the facts, file names, commit details and open questions. \
     Reply with the paragraph only.";

/// Prefix of the system message holding the running summary.
pub const SUMMARY_NOTE_PREFIX: &str = "Summary of the earlier conversation:\n";
