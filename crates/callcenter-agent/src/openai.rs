//! OpenAI-compatible chat completions client (Groq by default).

use async_trait::async_trait;
use callcenter_types::ToolCall;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{ChatMessage, ChatModel, ModelError, ModelReply, ModelRequest, ToolSpec};

fn default_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "openai/gpt-oss-120b".to_string()
}

fn default_temperature() -> f32 {
    1.0
}

fn default_top_p() -> f32 {
    1.0
}

fn default_max_completion_tokens() -> u32 {
    8192
}

fn default_reasoning_effort() -> Option<String> {
    Some("medium".to_string())
}

fn default_timeout_secs() -> u64 {
    30
}

/// Connection and sampling settings for the chat completions endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Bearer token. Omitted from the request when unset.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_completion_tokens")]
    pub max_completion_tokens: u32,
    /// Sent only to endpoints that understand it; `None` omits the field.
    #[serde(default = "default_reasoning_effort")]
    pub reasoning_effort: Option<String>,
    /// Upper bound on one model invocation, enforced by the agent loop.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_completion_tokens: default_max_completion_tokens(),
            reasoning_effort: default_reasoning_effort(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSettings")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_completion_tokens", &self.max_completion_tokens)
            .field("reasoning_effort", &self.reasoning_effort)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
    top_p: f32,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<&'a str>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    typ: String,
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    typ: &'static str,
    function: &'a ToolSpec,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        let (role, content, tool_calls, tool_call_id) = match message {
            ChatMessage::System(text) => ("system", Some(text.clone()), None, None),
            ChatMessage::User(text) => ("user", Some(text.clone()), None, None),
            ChatMessage::Assistant {
                content,
                tool_calls,
            } => {
                let calls = (!tool_calls.is_empty()).then(|| {
                    tool_calls
                        .iter()
                        .map(|call| WireToolCall {
                            id: call.id.clone(),
                            typ: function_type(),
                            function: WireFunction {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        })
                        .collect()
                });
                ("assistant", content.clone(), calls, None)
            }
            ChatMessage::Tool {
                tool_call_id,
                content,
            } => ("tool", Some(content.clone()), None, Some(tool_call_id.clone())),
        };
        Self {
            role: role.to_string(),
            content,
            tool_calls,
            tool_call_id,
        }
    }
}

/// Maps a chat completions response body onto the two-branch reply.
fn parse_completion(body: &str) -> Result<ModelReply, ModelError> {
    let parsed: CompletionResponse = serde_json::from_str(body)?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::Malformed("response has no choices".to_string()))?;

    let text = choice.message.content.filter(|t| !t.trim().is_empty());
    let calls: Vec<ToolCall> = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall::new(call.id, call.function.name, call.function.arguments))
        .collect();

    match choice.finish_reason.as_deref() {
        Some("tool_calls") if calls.is_empty() => Err(ModelError::Malformed(
            "finish_reason is tool_calls but no tool calls were returned".to_string(),
        )),
        Some("tool_calls") => Ok(ModelReply::ToolRequests { text, calls }),
        // Some providers report "stop" while still returning tool calls.
        _ if !calls.is_empty() => Ok(ModelReply::ToolRequests { text, calls }),
        _ => Ok(ModelReply::Final(text)),
    }
}

/// [`ChatModel`] over any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatModel {
    client: reqwest::Client,
    settings: ModelSettings,
}

impl OpenAiCompatModel {
    pub fn new(settings: ModelSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    fn request_body<'a>(&'a self, request: &ModelRequest<'a>) -> CompletionRequest<'a> {
        let tools: Vec<WireTool<'a>> = request
            .tools
            .iter()
            .map(|spec| WireTool {
                typ: "function",
                function: spec,
            })
            .collect();
        CompletionRequest {
            model: &self.settings.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            tool_choice: (!tools.is_empty()).then_some("auto"),
            tools,
            temperature: self.settings.temperature,
            top_p: self.settings.top_p,
            max_completion_tokens: self.settings.max_completion_tokens,
            reasoning_effort: self.settings.reasoning_effort.as_deref(),
            stream: false,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatModel {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelReply, ModelError> {
        let body = self.request_body(&request);
        let mut req = self.client.post(&self.settings.endpoint).json(&body);
        if let Some(key) = &self.settings.api_key {
            req = req.bearer_auth(key);
        }

        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_completion(&text)
    }

    fn name(&self) -> &str {
        &self.settings.model
    }
}
