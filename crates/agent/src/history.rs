//! Conversation history with summary-based compaction.
//!
//! The history always starts with the active system prompt. Once it grows to
//! `compact_threshold` messages, everything between the system prompt and the
//! last `keep_last` messages is folded into a running summary by one extra
//! completion call. The summary lives in a second leading system message:
//!
//! ```text
//! [system prompt, summary note, last K messages...]
//! ```

use repochat_config::{DEFAULT_COMPACT_THRESHOLD, DEFAULT_KEEP_LAST};
use repochat_core::error::ProviderError;
use repochat_core::message::Message;
use repochat_core::provider::{GenerationOptions, Provider, ProviderRequest};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::prompt::{SUMMARY_INSTRUCTIONS, SUMMARY_NOTE_PREFIX};

/// Summarization failed. The history is left exactly as it was.
#[derive(Debug, Clone, Error)]
pub enum CompactionError {
    #[error("summarization request failed: {0}")]
    Summarization(#[from] ProviderError),

    #[error("summarization returned an empty summary")]
    EmptySummary,
}

/// What `compact_if_needed` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactionOutcome {
    NotNeeded,
    Compacted { dropped: usize, retained: usize },
}

#[derive(Debug, Clone)]
pub struct History {
    messages: Vec<Message>,
    summary: Option<String>,
    compact_threshold: usize,
    keep_last: usize,
}

impl History {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
            summary: None,
            compact_threshold: DEFAULT_COMPACT_THRESHOLD,
            keep_last: DEFAULT_KEEP_LAST,
        }
    }

    /// Set the compaction trigger and the number of trailing messages kept verbatim.
    pub fn with_limits(mut self, compact_threshold: usize, keep_last: usize) -> Self {
        self.compact_threshold = compact_threshold;
        self.keep_last = keep_last;
        self
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn current(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn system_prompt(&self) -> &str {
        self.messages.first().map(|m| m.content.as_str()).unwrap_or_default()
    }

    /// The running summary, if compaction has happened.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Start over with a single new system prompt.
    pub fn reset(&mut self, system_prompt: impl Into<String>) {
        self.messages = vec![Message::system(system_prompt)];
        self.summary = None;
    }

    fn needs_compaction(&self) -> bool {
        self.messages.len() >= self.compact_threshold && self.messages.len() > self.keep_last + 1
    }

    /// Index of the first message that may be summarized away.
    fn first_droppable(&self) -> usize {
        if self.summary.is_some() { 2 } else { 1 }
    }

    /// Fold old messages into the running summary when the history is full.
    ///
    /// Makes at most one completion call. On failure nothing is changed.
    pub async fn compact_if_needed(
        &mut self,
        provider: &dyn Provider,
        model: &str,
        options: &GenerationOptions,
    ) -> Result<CompactionOutcome, CompactionError> {
        if !self.needs_compaction() {
            return Ok(CompactionOutcome::NotNeeded);
        }

        let start = self.first_droppable();
        let end = self.messages.len() - self.keep_last;
        if start >= end {
            return Ok(CompactionOutcome::NotNeeded);
        }

        debug!(len = self.messages.len(), dropping = end - start, "Compacting history");

        let request = ProviderRequest {
            model: model.to_string(),
            messages: vec![
                Message::system(SUMMARY_INSTRUCTIONS),
                Message::user(self.summary_input(&self.messages[start..end])),
            ],
            options: options.clone(),
        };

        let response = provider.complete(request).await.map_err(|e| {
            warn!(error = %e, "Summarization failed; history left unchanged");
            CompactionError::Summarization(e)
        })?;

        let summary = response.message.content.trim().to_string();
        if summary.is_empty() {
            warn!("Summarization returned nothing; history left unchanged");
            return Err(CompactionError::EmptySummary);
        }

        let mut compacted = Vec::with_capacity(self.keep_last + 2);
        compacted.push(self.messages[0].clone());
        compacted.push(Message::system(format!("{SUMMARY_NOTE_PREFIX}{summary}")));
        compacted.extend(self.messages.drain(end..));

        let dropped = end - start;
        self.messages = compacted;
        self.summary = Some(summary);

        info!(dropped, retained = self.keep_last, "History compacted");
        Ok(CompactionOutcome::Compacted {
            dropped,
            retained: self.keep_last,
        })
    }

    fn summary_input(&self, dropped: &[Message]) -> String {
        let mut input = String::new();
        if let Some(previous) = &self.summary {
            input.push_str("Previous summary:\n");
            input.push_str(previous);
            input.push_str("\n\n");
        }
        input.push_str("Conversation to summarize:\n");
        for message in dropped {
            input.push_str(&format!("{}: {}\n", message.role, message.content));
        }
        input
    }
}
