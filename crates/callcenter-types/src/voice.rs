//! Voice transport events and directives.
//!
//! The telephony layer delivers events (call started, caller spoke, caller
//! stayed silent, call ended) and renders the [`VoiceDirective`] it gets
//! back: speak some text, then either keep listening or hang up.

use serde::{Deserialize, Serialize};

/// A new inbound call was answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStarted {
    pub call_id: String,
    /// Caller identity (phone number in E.164 form).
    pub caller: String,
}

/// The caller finished speaking and the transport transcribed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtteranceEvent {
    pub call_id: String,
    pub caller: String,
    /// Transcribed speech. May be empty when recognition produced nothing.
    #[serde(default)]
    pub text: String,
    /// Recognizer confidence in `0.0..=1.0`, when the transport reports one.
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// The input timeout elapsed without any speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SilenceEvent {
    pub call_id: String,
    pub caller: String,
}

/// Call-end notification. Used for logging only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEnded {
    pub call_id: String,
    pub caller: String,
    pub status: String,
    #[serde(default)]
    pub duration_secs: u64,
}

/// Instruction for the voice transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum VoiceDirective {
    /// Speak `text`, then listen for the caller for up to `timeout_secs`.
    Listen {
        text: String,
        voice: String,
        language: String,
        #[serde(rename = "timeoutSecs")]
        timeout_secs: u64,
    },
    /// Speak `text`, then end the call.
    Hangup {
        text: String,
        voice: String,
        language: String,
    },
}

impl VoiceDirective {
    /// The text the transport will synthesize.
    pub fn text(&self) -> &str {
        match self {
            Self::Listen { text, .. } | Self::Hangup { text, .. } => text,
        }
    }

    pub fn ends_call(&self) -> bool {
        matches!(self, Self::Hangup { .. })
    }
}
