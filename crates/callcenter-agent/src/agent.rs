//! The bounded model/tool loop.

use callcenter_types::{Role, ToolCall, Turn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::model::{ChatMessage, ChatModel, ModelError, ModelReply, ModelRequest, ToolSpec};
use crate::tools::{ToolContext, ToolRegistry};

/// Spoken whenever the loop cannot produce an answer.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I was unable to process that request. Please try again.";

fn default_max_rounds() -> usize {
    8
}

fn default_tool_timeout_secs() -> u64 {
    10
}

fn default_history_limit() -> usize {
    10
}

fn default_search_limit() -> usize {
    3
}

/// Agent loop tuning, the `[agent]` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Maximum model invocations per utterance.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    /// Persisted turns injected ahead of each utterance.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Passages returned per knowledge search.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            tool_timeout_secs: default_tool_timeout_secs(),
            history_limit: default_history_limit(),
            search_limit: default_search_limit(),
        }
    }
}

/// Why a run ended with [`FALLBACK_REPLY`] instead of a model answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    EmptyReply,
    RoundLimit,
    ModelFailure,
}

/// Result of one agent run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOutcome {
    /// Speech-ready reply. Never empty.
    pub reply: String,
    /// Model invocations made.
    pub rounds: usize,
    /// Tool calls executed.
    pub tool_calls: usize,
    pub fallback: Option<FallbackReason>,
}

/// Standing instructions for the model on a phone call with `caller`.
pub fn system_directive(caller: &str) -> String {
    format!(
        "You are a friendly customer support agent on a phone call. \
         Everything you write is read aloud, so answer in plain conversational sentences: \
         no markdown, bullet points, numbered lists, tables or emojis. \
         Keep replies to two to four short sentences. \
         Always use your tools before answering questions about the caller's account, \
         tickets or company policies; never guess account details. \
         Be warm and empathetic, and address the caller by their first name once you know it. \
         When you create a support ticket, tell the caller the ticket ID. \
         If you cannot resolve the problem, offer to escalate it with a support ticket. \
         The caller's phone number is {caller}."
    )
}

enum LoopState {
    AwaitingModel,
    ExecutingTools(Vec<ToolCall>),
    Done {
        reply: String,
        fallback: Option<FallbackReason>,
    },
}

impl LoopState {
    fn fallback(reason: FallbackReason) -> Self {
        Self::Done {
            reply: FALLBACK_REPLY.to_string(),
            fallback: Some(reason),
        }
    }
}

/// Drives the model to a final answer, running tools in between.
pub struct AgentLoop {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    catalog: Vec<ToolSpec>,
    max_rounds: usize,
    model_timeout: Duration,
}

impl AgentLoop {
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolRegistry) -> Self {
        let catalog = tools.catalog();
        Self {
            model,
            tools,
            catalog,
            max_rounds: default_max_rounds(),
            model_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Answers `utterance` from `caller`, given earlier turns oldest first.
    ///
    /// Never fails. Model errors, empty answers and running out of rounds
    /// all produce [`FALLBACK_REPLY`] with the reason recorded.
    pub async fn run(&self, caller: &str, history: &[Turn], utterance: &str) -> AgentOutcome {
        let ctx = ToolContext::new(caller);
        let mut messages = transcript(caller, history, utterance);
        let mut rounds = 0;
        let mut tool_calls = 0;
        let mut state = LoopState::AwaitingModel;

        let (reply, fallback) = loop {
            state = match state {
                LoopState::AwaitingModel if rounds >= self.max_rounds => {
                    tracing::warn!(
                        caller = %caller,
                        rounds,
                        "agent hit the round limit without a final answer"
                    );
                    LoopState::fallback(FallbackReason::RoundLimit)
                }
                LoopState::AwaitingModel => {
                    rounds += 1;
                    match self.invoke(&messages).await {
                        Ok(ModelReply::Final(Some(text))) if !text.trim().is_empty() => {
                            LoopState::Done {
                                reply: text.trim().to_string(),
                                fallback: None,
                            }
                        }
                        Ok(ModelReply::Final(_)) => {
                            tracing::warn!(
                                caller = %caller,
                                rounds,
                                "model returned an empty answer"
                            );
                            LoopState::fallback(FallbackReason::EmptyReply)
                        }
                        Ok(ModelReply::ToolRequests { text, calls }) if calls.is_empty() => {
                            match text {
                                Some(text) if !text.trim().is_empty() => LoopState::Done {
                                    reply: text.trim().to_string(),
                                    fallback: None,
                                },
                                _ => LoopState::fallback(FallbackReason::EmptyReply),
                            }
                        }
                        Ok(ModelReply::ToolRequests { text, calls }) => {
                            messages.push(ChatMessage::Assistant {
                                content: text,
                                tool_calls: calls.clone(),
                            });
                            LoopState::ExecutingTools(calls)
                        }
                        Err(err) => {
                            tracing::warn!(
                                caller = %caller,
                                rounds,
                                error = %err,
                                "model invocation failed"
                            );
                            LoopState::fallback(FallbackReason::ModelFailure)
                        }
                    }
                }
                LoopState::ExecutingTools(calls) => {
                    for call in calls {
                        let content = self.tools.execute(&ctx, &call).await;
                        messages.push(ChatMessage::Tool {
                            tool_call_id: call.id,
                            content,
                        });
                        tool_calls += 1;
                    }
                    LoopState::AwaitingModel
                }
                LoopState::Done { reply, fallback } => break (reply, fallback),
            };
        };

        tracing::info!(
            caller = %caller,
            rounds,
            tool_calls,
            fallback = ?fallback,
            "agent run finished"
        );

        AgentOutcome {
            reply,
            rounds,
            tool_calls,
            fallback,
        }
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ModelReply, ModelError> {
        let request = ModelRequest {
            messages,
            tools: &self.catalog,
        };
        tokio::time::timeout(self.model_timeout, self.model.complete(request))
            .await
            .map_err(|_| ModelError::Timeout(self.model_timeout))?
    }
}

/// System directive, then history, then the new utterance.
///
/// Persisted tool turns are skipped: their matching requests are not stored,
/// and a tool result without its request is rejected by the model API.
fn transcript(caller: &str, history: &[Turn], utterance: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::System(system_directive(caller)));
    for turn in history {
        match turn.role {
            Role::Caller => messages.push(ChatMessage::User(turn.content.clone())),
            Role::Agent => messages.push(ChatMessage::assistant(turn.content.clone())),
            Role::Tool => {}
        }
    }
    messages.push(ChatMessage::User(utterance.to_string()));
    messages
}
