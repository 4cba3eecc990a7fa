//! The conversation loop of repochat.
//!
//! Each user turn follows the same cycle:
//!
//! 1. **Append** the user message to the history
//! 2. **Compact** the history if it has grown past its threshold
//! 3. **Complete** via the configured provider
//! 4. **Extract**: if the reply holds a tool call, run the tool, fold its
//!    output back into the history and go to step 2
//! 5. **Answer**: otherwise the reply is returned to the user
//!
//! The loop stops after `max_tool_turns` tool calls even if the model keeps
//! asking for more.

pub mod extract;
pub mod history;
pub mod loop_runner;
pub mod prompt;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use extract::{extract, Extraction};
pub use history::{CompactionError, CompactionOutcome, History};
pub use loop_runner::{AgentError, AgentLoop, TurnOutcome};
pub use session::Session;
