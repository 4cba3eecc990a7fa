//! Shared test doubles for the agent tests.

use async_trait::async_trait;
use repochat_core::error::ProviderError;
use repochat_core::message::Message;
use repochat_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use repochat_core::tool::{ToolDescriptor, ToolInvocation, ToolProvider};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted replies.
///
/// Once the script runs out it repeats `fallback`, or panics when there is none.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    fallback: Option<String>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<&str>) -> Self {
        Self::with_results(replies.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn with_results(results: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that gives the same reply forever.
    pub fn always(reply: &str) -> Self {
        Self {
            fallback: Some(reply.to_string()),
            ..Self::new(vec![])
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        let next = self.script.lock().unwrap().pop_front();
        let reply = match (next, &self.fallback) {
            (Some(result), _) => result?,
            (None, Some(fallback)) => fallback.clone(),
            (None, None) => panic!("ScriptedProvider: no reply scripted for call #{call}"),
        };

        Ok(make_text_response(&reply))
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A tool provider that records every invocation and answers with a fixed text.
pub struct RecordingTools {
    output: String,
    calls: Mutex<Vec<ToolInvocation>>,
}

impl RecordingTools {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolProvider for RecordingTools {
    fn descriptors(&self) -> Vec<ToolDescriptor> {
        vec![ToolDescriptor {
            name: "history-log".into(),
            description: "Recent commits".into(),
            parameter_names: vec!["limit".into()],
        }]
    }

    async fn execute(&self, invocation: &ToolInvocation) -> String {
        self.calls.lock().unwrap().push(invocation.clone());
        self.output.clone()
    }
}
