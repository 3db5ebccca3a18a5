//! Per-call dialog state machine.

use callcenter_agent::{AgentLoop, ConversationMemory, FallbackReason};
use callcenter_types::{CallEnded, CallStarted, SilenceEvent, Turn, UtteranceEvent, VoiceDirective};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::VoiceSettings;

pub const GREETING: &str =
    "Hello! Thank you for calling our support center. How can I help you today?";
pub const REPEAT_PROMPT: &str = "I didn't catch that. Could you please repeat?";
pub const NO_INPUT_MESSAGE: &str = "I didn't hear anything. Please call back when ready.";
pub const ANYTHING_ELSE_PROMPT: &str = "Is there anything else I can help you with?";
pub const CLOSING_MESSAGE: &str = "Thank you for calling. Have a great day. Goodbye!";

/// Where a call is in its dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    /// Greeting spoken, caller has not said anything yet.
    Greeted,
    /// At least one reply has been spoken.
    Conversing,
}

#[derive(Debug)]
struct CallState {
    caller: String,
    phase: CallPhase,
    silent_prompts: u32,
}

impl CallState {
    fn new(caller: &str) -> Self {
        Self {
            caller: caller.to_string(),
            phase: CallPhase::Greeted,
            silent_prompts: 0,
        }
    }
}

/// Something that went wrong during a turn without stopping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnWarning {
    /// History could not be loaded; the agent ran without it.
    HistoryUnavailable,
    /// The exchange could not be saved.
    PersistFailed,
    /// The agent answered with its fallback apology.
    AgentFallback(FallbackReason),
}

/// The directive for one utterance plus any degraded-path warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub directive: VoiceDirective,
    pub warnings: Vec<TurnWarning>,
}

/// Maps voice transport events to agent runs and voice directives.
///
/// Call state is keyed by call id. History and persistence are keyed by the
/// caller's phone number, and turns for one number are serialized so two
/// concurrent calls from the same phone never interleave their exchanges.
pub struct CallController {
    agent: AgentLoop,
    memory: ConversationMemory,
    settings: VoiceSettings,
    calls: Mutex<HashMap<String, CallState>>,
    caller_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CallController {
    pub fn new(agent: AgentLoop, memory: ConversationMemory, settings: VoiceSettings) -> Self {
        Self {
            agent,
            memory,
            settings,
            calls: Mutex::new(HashMap::new()),
            caller_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &VoiceSettings {
        &self.settings
    }

    pub fn model_name(&self) -> &str {
        self.agent.model_name()
    }

    pub async fn active_calls(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Callers with a serialization lock entry.
    pub async fn tracked_callers(&self) -> usize {
        self.caller_locks.lock().await.len()
    }

    pub async fn phase(&self, call_id: &str) -> Option<CallPhase> {
        self.calls.lock().await.get(call_id).map(|c| c.phase)
    }

    fn listen(&self, text: impl Into<String>) -> VoiceDirective {
        VoiceDirective::Listen {
            text: text.into(),
            voice: self.settings.voice.clone(),
            language: self.settings.language.clone(),
            timeout_secs: self.settings.input_timeout_secs,
        }
    }

    fn hangup(&self, text: impl Into<String>) -> VoiceDirective {
        VoiceDirective::Hangup {
            text: text.into(),
            voice: self.settings.voice.clone(),
            language: self.settings.language.clone(),
        }
    }

    /// Answers a new call with the greeting.
    pub async fn start_call(&self, event: &CallStarted) -> VoiceDirective {
        tracing::info!(call_id = %event.call_id, caller = %event.caller, "call started");
        self.calls
            .lock()
            .await
            .insert(event.call_id.clone(), CallState::new(&event.caller));
        self.listen(GREETING)
    }

    fn is_unintelligible(&self, event: &UtteranceEvent) -> bool {
        if event.text.trim().is_empty() {
            return true;
        }
        matches!(event.confidence, Some(c) if c < self.settings.min_confidence)
    }

    async fn caller_lock(&self, caller: &str) -> Arc<Mutex<()>> {
        self.caller_locks
            .lock()
            .await
            .entry(caller.to_string())
            .or_default()
            .clone()
    }

    /// Handles one transcribed utterance.
    ///
    /// Empty or low-confidence speech gets a repeat prompt without touching
    /// the agent or memory. Anything else is answered by the agent and the
    /// exchange is saved on a best-effort basis.
    pub async fn handle_utterance(&self, event: &UtteranceEvent) -> TurnOutcome {
        if self.is_unintelligible(event) {
            tracing::debug!(
                call_id = %event.call_id,
                confidence = ?event.confidence,
                "utterance not understood, asking caller to repeat"
            );
            self.calls
                .lock()
                .await
                .entry(event.call_id.clone())
                .or_insert_with(|| CallState::new(&event.caller));
            return TurnOutcome {
                directive: self.listen(REPEAT_PROMPT),
                warnings: Vec::new(),
            };
        }

        let utterance = event.text.trim();
        let caller = event.caller.as_str();
        let mut warnings = Vec::new();

        let lock = self.caller_lock(caller).await;
        let _guard = lock.lock().await;

        tracing::info!(call_id = %event.call_id, caller = %caller, utterance, "caller said");

        let history = match self.memory.load(caller).await {
            Ok(history) => history,
            Err(err) => {
                tracing::warn!(caller = %caller, error = %err, "continuing without history");
                warnings.push(TurnWarning::HistoryUnavailable);
                Vec::new()
            }
        };

        let outcome = self.agent.run(caller, &history, utterance).await;
        if let Some(reason) = outcome.fallback {
            warnings.push(TurnWarning::AgentFallback(reason));
        }

        if let Err(err) = self
            .memory
            .append(caller, &Turn::caller(utterance), &Turn::agent(outcome.reply.as_str()))
            .await
        {
            tracing::warn!(caller = %caller, error = %err, "exchange not saved");
            warnings.push(TurnWarning::PersistFailed);
        }

        {
            let mut calls = self.calls.lock().await;
            let state = calls
                .entry(event.call_id.clone())
                .or_insert_with(|| CallState::new(caller));
            state.phase = CallPhase::Conversing;
            state.silent_prompts = 0;
        }

        tracing::info!(call_id = %event.call_id, reply = %outcome.reply, "agent replied");

        TurnOutcome {
            directive: self.listen(outcome.reply),
            warnings,
        }
    }

    /// Handles an input timeout.
    ///
    /// Silence right after the greeting ends the call. Silence after a reply
    /// gets up to `max_silent_prompts` nudges before the closing message.
    pub async fn handle_silence(&self, event: &SilenceEvent) -> VoiceDirective {
        let (directive, ended) = {
            let mut calls = self.calls.lock().await;
            let state = calls
                .entry(event.call_id.clone())
                .or_insert_with(|| CallState::new(&event.caller));

            match state.phase {
                CallPhase::Greeted => {
                    tracing::info!(call_id = %event.call_id, "no input after greeting, hanging up");
                    let ended = calls.remove(&event.call_id);
                    (self.hangup(NO_INPUT_MESSAGE), ended)
                }
                CallPhase::Conversing
                    if state.silent_prompts < self.settings.max_silent_prompts =>
                {
                    state.silent_prompts += 1;
                    tracing::debug!(
                        call_id = %event.call_id,
                        prompts = state.silent_prompts,
                        "caller silent, nudging"
                    );
                    (self.listen(ANYTHING_ELSE_PROMPT), None)
                }
                CallPhase::Conversing => {
                    tracing::info!(call_id = %event.call_id, "caller silent, closing call");
                    let ended = calls.remove(&event.call_id);
                    (self.hangup(CLOSING_MESSAGE), ended)
                }
            }
        };

        if let Some(state) = ended {
            self.release_caller_lock(&state.caller).await;
        }
        directive
    }

    /// Records the end of a call and discards its in-memory state.
    pub async fn end_call(&self, event: &CallEnded) {
        tracing::info!(
            call_id = %event.call_id,
            caller = %event.caller,
            status = %event.status,
            duration_secs = event.duration_secs,
            "call ended"
        );

        let removed = self.calls.lock().await.remove(&event.call_id);
        let caller = removed.map(|s| s.caller).unwrap_or_else(|| event.caller.clone());
        self.release_caller_lock(&caller).await;
    }

    /// Drops the caller's lock entry unless a turn still holds it.
    async fn release_caller_lock(&self, caller: &str) {
        let mut locks = self.caller_locks.lock().await;
        if locks.get(caller).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(caller);
        }
    }
}
