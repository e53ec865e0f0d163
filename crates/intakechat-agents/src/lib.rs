pub mod context;
pub mod openai;
pub mod providers;
pub mod relay;
pub mod runtime;

pub use context::{HISTORY_WINDOW, build_prompt, is_greeting};
pub use openai::OpenAiProvider;
pub use providers::{ChatMessage, ChatRole, LlmProvider, LlmRequest, LlmResponse, Usage};
pub use relay::{CompletionRelay, RelayError};
pub use runtime::ChatRuntime;
