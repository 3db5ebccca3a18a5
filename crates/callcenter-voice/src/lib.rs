//! Call turn controller for the voice agent.
//!
//! The telephony transport reports call events (answered, caller spoke,
//! caller stayed silent, hung up) and renders the [`VoiceDirective`] it gets
//! back. [`CallController`] keeps the per-call dialog state, decides when to
//! re-prompt, nudge or say goodbye, and hands real utterances to the agent
//! loop with the caller's recent history.
//!
//! [`VoiceDirective`]: callcenter_types::VoiceDirective

pub mod config;
pub mod controller;

pub use config::VoiceSettings;
pub use controller::{
    CallController, CallPhase, TurnOutcome, TurnWarning, ANYTHING_ELSE_PROMPT, CLOSING_MESSAGE,
    GREETING, NO_INPUT_MESSAGE, REPEAT_PROMPT,
};
