//! The agent reasoning loop implementation.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use repochat_config::{
    AppConfig, ExhaustionPolicy, DEFAULT_COMPACT_THRESHOLD, DEFAULT_KEEP_LAST, DEFAULT_MAX_TOOL_TURNS,
    DEFAULT_TOOL_OUTPUT_BUDGET,
};
use repochat_core::error::ProviderError;
use repochat_core::event::{DomainEvent, EventBus};
use repochat_core::message::{ConversationId, Message};
use repochat_core::provider::{GenerationOptions, Provider, ProviderRequest};
use repochat_core::tool::{truncate_output, ToolProvider};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::extract::{extract, Extraction};
use crate::history::{CompactionError, CompactionOutcome, History};
use crate::prompt::{build_system_prompt, tool_result_message, EXHAUSTION_NOTICE};
use crate::session::Session;

/// How a user turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered.
    Answer(String),
    /// The tool-call budget ran out first. `reply` is what the user is shown.
    BudgetExhausted { tool_turns: u32, reply: String },
}

impl TurnOutcome {
    /// The text to show the user.
    pub fn text(&self) -> &str {
        match self {
            Self::Answer(text) => text,
            Self::BudgetExhausted { reply, .. } => reply,
        }
    }
}

/// A user turn that did not complete.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("completion failed: {0}")]
    Completion(#[from] ProviderError),

    #[error("history compaction failed: {0}")]
    Compaction(#[from] CompactionError),

    #[error("no answer after {turns} tool calls")]
    Incomplete { turns: u32 },

    #[error("turn cancelled")]
    Cancelled,
}

/// The core agent loop that orchestrates LLM calls and tool execution.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// Tools the model may call
    tools: Arc<dyn ToolProvider>,

    /// The model to use
    model: String,

    /// Sampling settings for every user-facing completion
    options: GenerationOptions,

    /// Maximum tool calls per user turn
    max_tool_turns: u32,

    /// Characters of each tool output folded back into the history
    tool_output_budget: usize,

    exhaustion_policy: ExhaustionPolicy,

    compact_threshold: usize,
    keep_last: usize,

    /// Event bus for domain events
    event_bus: Arc<EventBus>,
}

impl AgentLoop {
    /// Create a new agent loop with default limits.
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<dyn ToolProvider>,
        model: impl Into<String>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            options: GenerationOptions::default(),
            max_tool_turns: DEFAULT_MAX_TOOL_TURNS,
            tool_output_budget: DEFAULT_TOOL_OUTPUT_BUDGET,
            exhaustion_policy: ExhaustionPolicy::default(),
            compact_threshold: DEFAULT_COMPACT_THRESHOLD,
            keep_last: DEFAULT_KEEP_LAST,
            event_bus,
        }
    }

    /// Create an agent loop with every limit taken from the configuration.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<dyn ToolProvider>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self::new(provider, tools, &config.model, event_bus)
            .with_options(config.generation.to_options())
            .with_max_tool_turns(config.agent.max_tool_turns)
            .with_tool_output_budget(config.agent.tool_output_budget)
            .with_exhaustion_policy(config.agent.on_budget_exhausted)
            .with_history_limits(config.history.compact_threshold, config.history.keep_last)
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the maximum number of tool calls per user turn.
    pub fn with_max_tool_turns(mut self, max: u32) -> Self {
        self.max_tool_turns = max.max(1);
        self
    }

    pub fn with_tool_output_budget(mut self, max_chars: usize) -> Self {
        self.tool_output_budget = max_chars;
        self
    }

    pub fn with_exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.exhaustion_policy = policy;
        self
    }

    /// Set when history compaction triggers and how many messages it keeps.
    pub fn with_history_limits(mut self, compact_threshold: usize, keep_last: usize) -> Self {
        self.compact_threshold = compact_threshold;
        self.keep_last = keep_last;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// The full system prompt for a seed: the seed plus the tool catalog.
    pub fn system_prompt(&self, seed: &str) -> String {
        build_system_prompt(seed, &self.tools.descriptors())
    }

    /// A fresh history for a seed prompt, carrying this loop's compaction limits.
    pub fn new_history(&self, seed: &str) -> History {
        History::new(self.system_prompt(seed)).with_limits(self.compact_threshold, self.keep_last)
    }

    /// Open a conversation whose system prompt is built from `seed`.
    pub fn start_session(self: &Arc<Self>, seed: &str) -> Session {
        Session::new(Arc::clone(self), seed)
    }

    /// Run one user turn against `history`.
    ///
    /// The history is mutated as the turn progresses. On error it may hold a
    /// partial turn; [`Session`] runs turns on a copy so callers never see that.
    pub async fn run_turn(
        &self,
        history: &mut History,
        conversation_id: &ConversationId,
        input: &str,
    ) -> Result<TurnOutcome, AgentError> {
        info!(
            conversation_id = %conversation_id,
            messages = history.len(),
            "Processing user turn"
        );

        history.append(Message::user(input));
        let mut tool_turns = 0u32;
        let mut last_tool_output: Option<String> = None;

        loop {
            self.compact(history, conversation_id).await?;

            debug!(
                conversation_id = %conversation_id,
                tool_turns,
                messages = history.len(),
                "Awaiting completion"
            );

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: history.current().to_vec(),
                options: self.options.clone(),
            };

            let response = self.provider.complete(request).await.inspect_err(|e| {
                warn!(conversation_id = %conversation_id, error = %e, "Completion failed");
            })?;

            self.event_bus.publish(DomainEvent::CompletionReceived {
                conversation_id: conversation_id.to_string(),
                model: response.model.clone(),
                tokens_used: response.usage.as_ref().map(|u| u.total_tokens),
                timestamp: Utc::now(),
            });

            let text = response.message.content;
            let call = match extract(&text) {
                Extraction::ToolCall(call) => call,
                Extraction::FinalAnswer(answer) | Extraction::Unparseable(answer) => {
                    history.append(Message::assistant(answer.clone()));
                    self.event_bus.publish(DomainEvent::TurnCompleted {
                        conversation_id: conversation_id.to_string(),
                        tool_turns,
                        timestamp: Utc::now(),
                    });
                    info!(conversation_id = %conversation_id, tool_turns, "Turn answered");
                    return Ok(TurnOutcome::Answer(answer));
                }
            };

            debug!(tool = %call.name, params = ?call.params, "Dispatching tool call");
            history.append(Message::assistant(text));

            let start = Instant::now();
            let output = self.tools.execute(&call).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            self.event_bus.publish(DomainEvent::ToolExecuted {
                tool_name: call.name.clone(),
                output_chars: output.chars().count(),
                duration_ms,
                timestamp: Utc::now(),
            });

            let output = truncate_output(&output, self.tool_output_budget);
            history.append(Message::user(tool_result_message(&call.name, &output)));
            last_tool_output = Some(output);
            tool_turns += 1;

            if tool_turns >= self.max_tool_turns {
                return self.budget_exhausted(history, conversation_id, tool_turns, last_tool_output);
            }
        }
    }

    async fn compact(&self, history: &mut History, conversation_id: &ConversationId) -> Result<(), AgentError> {
        let outcome = history
            .compact_if_needed(self.provider.as_ref(), &self.model, &self.options)
            .await?;

        if let CompactionOutcome::Compacted { dropped, retained } = outcome {
            self.event_bus.publish(DomainEvent::HistoryCompacted {
                conversation_id: conversation_id.to_string(),
                dropped,
                retained,
                timestamp: Utc::now(),
            });
        }
        Ok(())
    }

    fn budget_exhausted(
        &self,
        history: &mut History,
        conversation_id: &ConversationId,
        tool_turns: u32,
        last_tool_output: Option<String>,
    ) -> Result<TurnOutcome, AgentError> {
        warn!(
            conversation_id = %conversation_id,
            tool_turns,
            policy = ?self.exhaustion_policy,
            "Tool call budget exhausted"
        );
        self.event_bus.publish(DomainEvent::TurnBudgetExhausted {
            conversation_id: conversation_id.to_string(),
            tool_turns,
            timestamp: Utc::now(),
        });

        let reply = match self.exhaustion_policy {
            ExhaustionPolicy::Incomplete => return Err(AgentError::Incomplete { turns: tool_turns }),
            ExhaustionPolicy::Notice => EXHAUSTION_NOTICE.to_string(),
            ExhaustionPolicy::LastToolOutput => last_tool_output.unwrap_or_else(|| EXHAUSTION_NOTICE.to_string()),
        };

        history.append(Message::assistant(reply.clone()));
        Ok(TurnOutcome::BudgetExhausted { tool_turns, reply })
    }
}
