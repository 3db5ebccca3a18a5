//! Model inference boundary.

use async_trait::async_trait;
use callcenter_types::ToolCall;
use serde::Serialize;
use std::time::Duration;

/// One message of the working transcript sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    System(String),
    User(String),
    /// A model turn. Carries the tool requests verbatim when the model asked
    /// for tools, so their correlation ids stay intact.
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    /// Result of one tool call, tagged with the request's correlation id.
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }
}

/// A tool the model may call: name, description and JSON-schema parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: serde_json::Value,
}

/// Input to one model invocation. Tool choice is always automatic.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub tools: &'a [ToolSpec],
}

/// What the model decided to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    /// The model finished; the text (if any) is the answer.
    Final(Option<String>),
    /// The model wants these tools run before it continues.
    ToolRequests {
        text: Option<String>,
        calls: Vec<ToolCall>,
    },
}

/// Errors from a model invocation. The agent loop turns all of them into
/// its fallback reply.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("malformed model response: {0}")]
    Malformed(String),

    #[error("model did not respond within {}s", .0.as_secs())]
    Timeout(Duration),
}

/// A chat model that supports tool calling.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelReply, ModelError>;

    /// Model identifier, for logs and health output.
    fn name(&self) -> &str;
}
