use intakechat_agents::{ChatMessage, CompletionRelay};
use tracing::{info, warn};

/// Cap on how much source text is sent for summarization.
const MAX_CONDENSE_INPUT: usize = 12_000;

/// Summarize one source blob through the completion service.
///
/// A failed summary keeps the (truncated) original text behind a short
/// notice, so the chat still has something to ground answers on.
pub async fn condense_source(relay: &CompletionRelay, label: &str, text: &str) -> String {
    let input = clip(text, MAX_CONDENSE_INPUT);
    let messages = vec![
        ChatMessage::system(
            "Summarize the following content for a course advisor. Keep course names, \
             durations, fees, schedules, training modes and contact details. Be concise.",
        ),
        ChatMessage::user(format!("{label}:\n{input}")),
    ];

    match relay.complete(messages).await {
        Ok(summary) => {
            info!(label, from = text.len(), to = summary.len(), "condensed source");
            summary
        }
        Err(e) => {
            warn!(label, "condensation failed: {e}");
            format!("Summary unavailable: {e}\n\n{input}")
        }
    }
}

fn clip(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
