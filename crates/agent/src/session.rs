//! One conversation with the agent.
//!
//! A turn runs on a copy of the history and is committed only when it
//! completes. Errors and cancellation leave the history exactly as it was
//! before the user's message.

use std::future::Future;
use std::sync::Arc;

use repochat_core::message::{ConversationId, Message};
use tracing::{debug, info, warn};

use crate::history::History;
use crate::loop_runner::{AgentError, AgentLoop, TurnOutcome};

pub struct Session {
    agent: Arc<AgentLoop>,
    id: ConversationId,
    seed: String,
    history: History,
}

impl Session {
    pub(crate) fn new(agent: Arc<AgentLoop>, seed: &str) -> Self {
        let history = agent.new_history(seed);
        let id = ConversationId::new();
        debug!(conversation_id = %id, "Session started");
        Self {
            agent,
            id,
            seed: seed.to_string(),
            history,
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    /// The seed text the system prompt was built from.
    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn messages(&self) -> &[Message] {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Run one user turn to completion.
    pub async fn submit(&mut self, input: &str) -> Result<TurnOutcome, AgentError> {
        self.submit_until(input, std::future::pending::<()>()).await
    }

    /// Run one user turn, abandoning it as soon as `cancel` resolves.
    pub async fn submit_until<F>(&mut self, input: &str, cancel: F) -> Result<TurnOutcome, AgentError>
    where
        F: Future,
    {
        let mut working = self.history.clone();

        let outcome = tokio::select! {
            biased;
            _ = cancel => {
                warn!(conversation_id = %self.id, "Turn cancelled; history rolled back");
                return Err(AgentError::Cancelled);
            }
            result = self.agent.run_turn(&mut working, &self.id, input) => result?,
        };

        self.history = working;
        Ok(outcome)
    }

    /// Clear the conversation, keeping the current seed.
    pub fn reset(&mut self) {
        self.history = self.agent.new_history(&self.seed);
        info!(conversation_id = %self.id, "Conversation reset");
    }

    /// Replace the system prompt seed and clear the conversation.
    pub fn set_system_prompt(&mut self, seed: &str) {
        self.seed = seed.to_string();
        self.reset();
    }

    /// Close the session, releasing its handle on the agent and provider.
    pub fn end(self) {
        debug!(
            conversation_id = %self.id,
            messages = self.history.len(),
            "Session ended"
        );
    }
}
