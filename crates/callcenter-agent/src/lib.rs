//! Agentic tool-calling loop for the call center.
//!
//! A caller's utterance is answered by repeatedly invoking a chat model with
//! the conversation so far and a catalog of tools. When the model asks for
//! tools, the [`ToolRegistry`] runs them against the record store and the
//! knowledge index and feeds the results back; when it answers, the text is
//! the agent's reply. The loop is bounded and never fails: every problem
//! degrades to a fixed apology the caller can hear.
//!
//! The model, stores and search index are injected as trait objects so the
//! loop can be driven by test doubles.

mod agent;
mod memory;
mod model;
mod openai;
mod tools;

pub use agent::{
    system_directive, AgentLoop, AgentOutcome, AgentSettings, FallbackReason, FALLBACK_REPLY,
};
pub use memory::{ConversationMemory, MemoryError};
pub use model::{ChatMessage, ChatModel, ModelError, ModelReply, ModelRequest, ToolSpec};
pub use openai::{ModelSettings, OpenAiCompatModel};
pub use tools::{ToolContext, ToolRegistry, TOOL_ERROR_MARKER};
