use serde::{Deserialize, Serialize};

fn default_voice() -> String {
    "Polly.Joanna".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_input_timeout_secs() -> u64 {
    8
}

fn default_max_silent_prompts() -> u32 {
    1
}

/// Speech rendering and turn-taking settings, the `[voice]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Synthesis voice name passed through to the transport.
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// How long the transport listens before reporting silence.
    #[serde(default = "default_input_timeout_secs")]
    pub input_timeout_secs: u64,
    /// "Anything else?" nudges before a silent caller is said goodbye to.
    #[serde(default = "default_max_silent_prompts")]
    pub max_silent_prompts: u32,
    /// Transcriptions below this confidence are treated as unheard.
    /// `0.0` accepts everything.
    #[serde(default)]
    pub min_confidence: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice: default_voice(),
            language: default_language(),
            input_timeout_secs: default_input_timeout_secs(),
            max_silent_prompts: default_max_silent_prompts(),
            min_confidence: 0.0,
        }
    }
}
