use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use intakechat_common::{ChatTurn, Phase, Profile, SessionId, SourceContent};
use serde::Serialize;

/// A visitor action that may move the session between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ChooseForm,
    ChooseChat,
    Submit,
    Skip,
    Ask,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ChooseForm => "choose form",
            Action::ChooseChat => "choose chat",
            Action::Submit => "submit",
            Action::Skip => "skip",
            Action::Ask => "ask",
        }
    }
}

/// Phase reached by taking `action` in `phase`, or `None` if the action is
/// not accepted there. Chat is terminal: only questions are accepted.
pub fn next_phase(phase: Phase, action: Action) -> Option<Phase> {
    match (phase, action) {
        (Phase::Neutral, Action::ChooseForm) => Some(Phase::Intake),
        (Phase::Neutral, Action::ChooseChat) => Some(Phase::Chat),
        (Phase::Intake, Action::Submit | Action::Skip) => Some(Phase::Chat),
        (Phase::Chat, Action::Ask) => Some(Phase::Chat),
        _ => None,
    }
}

/// Per-visitor conversation state.
///
/// Created on first contact and dropped when the visitor leaves or the
/// session idles out. Turns are append-only.
#[derive(Debug)]
pub struct ChatSession {
    pub id: SessionId,
    pub phase: Phase,
    pub turns: Vec<ChatTurn>,
    pub profile: Option<Profile>,
    /// Grounding content, loaded once per session on the first real question.
    pub sources: Option<Arc<SourceContent>>,
    pub created_at: DateTime<Utc>,
    last_active: Instant,
}

impl ChatSession {
    pub fn new(phase: Phase) -> Self {
        Self {
            id: SessionId::new(),
            phase,
            turns: Vec::new(),
            profile: None,
            sources: None,
            created_at: Utc::now(),
            last_active: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            phase: self.phase,
            turns: self.turns.len(),
            has_profile: self.profile.is_some(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub phase: Phase,
    pub turns: usize,
    pub has_profile: bool,
    pub created_at: DateTime<Utc>,
}
