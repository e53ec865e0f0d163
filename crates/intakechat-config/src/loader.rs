use std::path::{Path, PathBuf};
use std::str::FromStr;

use intakechat_common::{Error, Phase, Result};
use tracing::{debug, info};
use url::Url;

use crate::model::{
    AppConfig, GatewayConfig, IntakeConfig, LlmConfig, MailConfig, RateLimitConfig, SourcesConfig,
};

/// Reads [`AppConfig`] from the process environment, once, at startup.
///
/// Required settings fail fast with [`Error::Config`] naming the missing key;
/// everything else falls back to [`AppConfig::default`].
pub struct ConfigLoader<F> {
    lookup: F,
}

impl ConfigLoader<fn(&str) -> Option<String>> {
    /// Load `.env` (if present) and then read the process environment.
    pub fn from_env() -> Result<AppConfig> {
        match dotenvy::dotenv() {
            Ok(path) => info!("loaded environment overrides from {}", path.display()),
            Err(e) if e.not_found() => debug!("no .env file found"),
            Err(e) => return Err(Error::Config(format!("failed to read .env: {e}"))),
        }
        Self::process_env().load()
    }

    /// Load a specific env file before reading the process environment.
    pub fn from_env_file(path: &Path) -> Result<AppConfig> {
        dotenvy::from_path(path).map_err(|e| {
            Error::Config(format!("failed to read env file {}: {e}", path.display()))
        })?;
        info!("loaded environment overrides from {}", path.display());
        Self::process_env().load()
    }

    fn process_env() -> Self {
        ConfigLoader { lookup: env_lookup }
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl<F> ConfigLoader<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn with_lookup(lookup: F) -> Self {
        Self { lookup }
    }

    pub fn load(&self) -> Result<AppConfig> {
        let defaults = AppConfig::default();

        let gateway = GatewayConfig {
            host: self.optional("GATEWAY_HOST").unwrap_or(defaults.gateway.host),
            port: self.parsed("GATEWAY_PORT", defaults.gateway.port)?,
            session_idle_secs: self
                .positive("SESSION_IDLE_SECS", defaults.gateway.session_idle_secs)?,
            rate_limit: RateLimitConfig {
                per_second: self.positive(
                    "RATE_LIMIT_PER_SECOND",
                    defaults.gateway.rate_limit.per_second,
                )?,
                burst_size: self
                    .positive("RATE_LIMIT_BURST", defaults.gateway.rate_limit.burst_size)?,
            },
        };

        let mail = MailConfig {
            smtp_host: self.optional("SMTP_HOST").unwrap_or(defaults.mail.smtp_host),
            smtp_port: self.parsed("SMTP_PORT", defaults.mail.smtp_port)?,
            sender_email: self.mailbox("SENDER_EMAIL")?,
            sender_password: self.required("SENDER_PASSWORD")?,
            recipient_email: self.mailbox("RECEIVER_EMAIL")?,
        };

        let llm = LlmConfig {
            api_key: self.required("OPENAI_API_KEY")?,
            base_url: self
                .optional("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.llm.base_url),
            model: self.optional("CHAT_MODEL").unwrap_or(defaults.llm.model),
            max_tokens: self.optional_parsed("MAX_OUTPUT_TOKENS")?.or(defaults.llm.max_tokens),
            temperature: self.optional_parsed("TEMPERATURE")?.or(defaults.llm.temperature),
            timeout_secs: self.positive("RELAY_TIMEOUT_SECS", defaults.llm.timeout_secs)?,
            persona: self
                .optional("ASSISTANT_PERSONA")
                .unwrap_or(defaults.llm.persona),
            greeting: self.optional("GREETING_REPLY").unwrap_or(defaults.llm.greeting),
        };

        let sources = SourcesConfig {
            document_path: PathBuf::from(self.required("PDF_PATH")?),
            page_url: self.web_url("WEBSITE_URL")?,
            condense: self.flag("CONDENSE_SOURCES", defaults.sources.condense)?,
        };

        let intake = IntakeConfig {
            required_fields: self
                .optional("INTAKE_FIELDS")
                .map(|raw| split_fields(&raw))
                .unwrap_or(defaults.intake.required_fields),
            start_phase: self.phase("START_PHASE", defaults.intake.start_phase)?,
            require_notification: self
                .flag("REQUIRE_NOTIFICATION", defaults.intake.require_notification)?,
        };

        Ok(AppConfig {
            gateway,
            mail,
            llm,
            sources,
            intake,
        })
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .ok_or_else(|| Error::Config(format!("missing required setting {key}")))
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.optional_parsed(key)?.unwrap_or(default))
    }

    /// Like `parsed`, for durations and rates where zero would disable the
    /// bound entirely.
    fn positive<T: FromStr + PartialOrd + Default>(&self, key: &str, default: T) -> Result<T> {
        let value = self.parsed(key, default)?;
        if value <= T::default() {
            return Err(Error::Config(format!(
                "invalid value for {key}: must be greater than zero"
            )));
        }
        Ok(value)
    }

    fn optional_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.optional(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| Error::Config(format!("invalid value for {key}: '{raw}'"))),
        }
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool> {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(Error::Config(format!(
                    "invalid value for {key}: '{raw}' (expected true/false)"
                ))),
            },
        }
    }

    fn phase(&self, key: &str, default: Phase) -> Result<Phase> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        match raw.parse::<Phase>() {
            Ok(Phase::Chat) => Err(Error::Config(format!(
                "invalid value for {key}: sessions cannot start in chat"
            ))),
            Ok(phase) => Ok(phase),
            Err(e) => Err(Error::Config(format!("invalid value for {key}: {e}"))),
        }
    }

    fn mailbox(&self, key: &str) -> Result<String> {
        let value = self.required(key)?;
        match value.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(value),
            _ => Err(Error::Config(format!(
                "invalid value for {key}: '{value}' is not an email address"
            ))),
        }
    }

    fn web_url(&self, key: &str) -> Result<String> {
        let value = self.required(key)?;
        let url = Url::parse(&value)
            .map_err(|e| Error::Config(format!("invalid value for {key}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "invalid value for {key}: scheme must be http or https"
            )));
        }
        Ok(url.to_string())
    }
}

fn split_fields(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}
