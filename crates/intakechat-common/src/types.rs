use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier for one visitor session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Coarse UI phase gating which visitor actions are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Neutral,
    Intake,
    Chat,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Neutral => "neutral",
            Phase::Intake => "intake",
            Phase::Chat => "chat",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neutral" => Ok(Phase::Neutral),
            "intake" | "form" => Ok(Phase::Intake),
            "chat" => Ok(Phase::Chat),
            other => Err(format!("unknown phase '{other}'")),
        }
    }
}

/// Visitor-supplied profile collected by the intake form.
///
/// `fields` holds the free-text answers keyed by field name
/// (e.g. `area_of_interest`, `preferred_course`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// How a turn's answer was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnOutcome {
    Answered,
    Greeting,
    Failed { reason: String },
}

impl TurnOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, TurnOutcome::Failed { .. })
    }
}

/// One question/answer exchange in a chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub user_text: String,
    pub bot_text: String,
    pub outcome: TurnOutcome,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(
        user_text: impl Into<String>,
        bot_text: impl Into<String>,
        outcome: TurnOutcome,
    ) -> Self {
        Self {
            user_text: user_text.into(),
            bot_text: bot_text.into(),
            outcome,
            timestamp: Utc::now(),
        }
    }
}

/// Plain-text grounding content, loaded once per chat activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceContent {
    pub document_text: String,
    pub page_text: String,
}
