use intakechat_common::{ChatTurn, SourceContent, TurnOutcome};
use tracing::{info, instrument, warn};

use crate::context::{build_prompt, is_greeting};
use crate::relay::CompletionRelay;

/// Shown in place of an answer when the completion service fails. The
/// failure reason travels separately in [`TurnOutcome::Failed`].
pub const FAILED_REPLY: &str =
    "Sorry, I couldn't get an answer right now. Please try again in a moment.";

/// Answers chat questions: greeting fast path, prompt assembly, relay.
pub struct ChatRuntime {
    relay: CompletionRelay,
    persona: String,
    greeting: String,
}

impl ChatRuntime {
    pub fn new(
        relay: CompletionRelay,
        persona: impl Into<String>,
        greeting: impl Into<String>,
    ) -> Self {
        Self {
            relay,
            persona: persona.into(),
            greeting: greeting.into(),
        }
    }

    pub fn relay(&self) -> &CompletionRelay {
        &self.relay
    }

    /// The canned reply for a bare greeting, or `None` if `question` needs
    /// the completion service.
    pub fn greeting_reply(&self, question: &str) -> Option<ChatTurn> {
        is_greeting(question)
            .then(|| ChatTurn::new(question, self.greeting.as_str(), TurnOutcome::Greeting))
    }

    /// Build the prompt from `source` and the recent `history`, relay it,
    /// and return the new turn. Never fails: relay errors become a
    /// [`TurnOutcome::Failed`] turn.
    #[instrument(skip_all, fields(history = history.len()))]
    pub async fn answer(
        &self,
        question: &str,
        source: &SourceContent,
        history: &[ChatTurn],
    ) -> ChatTurn {
        let messages = build_prompt(question, source, history, &self.persona);
        match self.relay.complete(messages).await {
            Ok(text) => {
                info!(answer_chars = text.len(), "question answered");
                ChatTurn::new(question, text, TurnOutcome::Answered)
            }
            Err(e) => {
                warn!("answer degraded: {e}");
                ChatTurn::new(
                    question,
                    FAILED_REPLY,
                    TurnOutcome::Failed {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }
}
