use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use intakechat_common::Phase;
use serde::Serialize;

pub const DEFAULT_PERSONA: &str = "You are the admissions assistant for a technology training institute. \
Answer questions about courses, schedules, fees and enrollment using only the provided website and \
brochure content. Keep answers short and friendly. If the content does not cover a question, say so \
and suggest contacting the institute.";

pub const DEFAULT_GREETING: &str =
    "Hello! Welcome. Ask me anything about our courses, training modes or enrollment.";

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub mail: MailConfig,
    pub llm: LlmConfig,
    pub sources: SourcesConfig,
    pub intake: IntakeConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub session_idle_secs: u64,
    pub rate_limit: RateLimitConfig,
}

impl GatewayConfig {
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            session_idle_secs: 1800,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RateLimitConfig {
    pub per_second: u64,
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 1,
            burst_size: 60,
        }
    }
}

/// Outbound notification mail settings.
#[derive(Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender_email: String,
    pub sender_password: String,
    pub recipient_email: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            sender_email: String::new(),
            sender_password: String::new(),
            recipient_email: String::new(),
        }
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("sender_email", &self.sender_email)
            .field("sender_password", &mask(&self.sender_password))
            .field("recipient_email", &self.recipient_email)
            .finish()
    }
}

/// Completion service settings.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub timeout_secs: u64,
    pub persona: String,
    pub greeting: String,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: Some(400),
            temperature: Some(0.2),
            timeout_secs: 30,
            persona: DEFAULT_PERSONA.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &mask(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SourcesConfig {
    pub document_path: PathBuf,
    pub page_url: String,
    /// Summarize each source once through the completion service before caching.
    pub condense: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntakeConfig {
    /// Free-text profile fields that must be present and non-empty.
    pub required_fields: Vec<String>,
    pub start_phase: Phase,
    /// Keep the visitor in intake when the notification cannot be delivered.
    pub require_notification: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            required_fields: vec!["area_of_interest".to_string()],
            start_phase: Phase::Intake,
            require_notification: false,
        }
    }
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "***" }
}
