//! Interactive terminal client for the call controller.
//!
//! Simulates one phone call: each line typed is an utterance, an empty line
//! is unrecognized speech, `/silence` is an input timeout. `quit`, `exit` or
//! `q` hangs up.

use callcenter_server::bootstrap::{bootstrap, init_tracing, resolve_config_path};
use callcenter_server::config;
use callcenter_types::{CallEnded, CallStarted, SilenceEvent, UtteranceEvent, VoiceDirective};
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const CONSOLE_CALLER: &str = "+1234567890";

fn render(directive: &VoiceDirective) -> String {
    let suffix = if directive.ends_call() { " [hangup]" } else { "" };
    format!("Agent: {}{suffix}\n", directive.text())
}

#[tokio::main]
async fn main() {
    let (config_path, _) = resolve_config_path();
    let config = config::load_config(config_path.as_deref().or(Some("config.toml")))
        .expect("failed to load configuration");

    init_tracing(&config.logging);

    let controller = bootstrap(&config)
        .await
        .expect("failed to initialize call controller");

    let call_id = format!("console-{}", uuid::Uuid::new_v4());
    let caller = std::env::var("CALLCENTER_CONSOLE_CALLER")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| CONSOLE_CALLER.to_string());
    let started_at = Instant::now();

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let greeting = controller
        .start_call(&CallStarted {
            call_id: call_id.clone(),
            caller: caller.clone(),
        })
        .await;
    let banner = format!(
        "Call center console ({caller}, model {}). Type 'quit' to hang up.\n",
        controller.model_name()
    );
    let _ = stdout.write_all(banner.as_bytes()).await;
    let _ = stdout.write_all(render(&greeting).as_bytes()).await;

    let status = loop {
        let _ = stdout.write_all(b"You: ").await;
        let _ = stdout.flush().await;

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break "completed",
            Err(err) => {
                tracing::error!(error = %err, "failed to read stdin");
                break "failed";
            }
        };
        let input = line.trim();

        if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "q") {
            break "completed";
        }

        let directive = if input == "/silence" {
            controller
                .handle_silence(&SilenceEvent {
                    call_id: call_id.clone(),
                    caller: caller.clone(),
                })
                .await
        } else {
            let outcome = controller
                .handle_utterance(&UtteranceEvent {
                    call_id: call_id.clone(),
                    caller: caller.clone(),
                    text: input.to_string(),
                    confidence: None,
                })
                .await;
            for warning in &outcome.warnings {
                let _ = stdout
                    .write_all(format!("  (warning: {warning:?})\n").as_bytes())
                    .await;
            }
            outcome.directive
        };

        let _ = stdout.write_all(render(&directive).as_bytes()).await;
        if directive.ends_call() {
            break "completed";
        }
    };

    controller
        .end_call(&CallEnded {
            call_id,
            caller,
            status: status.to_string(),
            duration_secs: started_at.elapsed().as_secs(),
        })
        .await;
}
