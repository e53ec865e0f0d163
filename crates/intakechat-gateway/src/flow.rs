//! Event handlers for the visitor flow: choose, submit, skip and ask.
//!
//! Each handler takes the visitor's [`ChatSession`] by `&mut`, so the caller
//! decides how sessions are stored and serialized. Handlers either apply a
//! full transition or leave the session untouched.

use std::sync::Arc;

use intakechat_agents::ChatRuntime;
use intakechat_channels::Notifier;
use intakechat_common::{ChatTurn, Phase, Profile, SourceContent};
use intakechat_security::{ProfileValidator, ValidationError};
use intakechat_sources::ContentSource;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::session::{Action, ChatSession, next_phase};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("cannot {action} while in {phase} phase")]
    InvalidTransition { phase: Phase, action: &'static str },

    #[error("invalid profile: {0}")]
    Validation(#[from] ValidationError),

    #[error("notification failed: {0}")]
    Notification(String),

    #[error("message text is empty")]
    EmptyMessage,

    #[error("unknown session")]
    UnknownSession,
}

/// Which way a visitor leaves the neutral landing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    Form,
    Chat,
}

impl std::str::FromStr for EntryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "form" | "intake" => Ok(EntryMode::Form),
            "chat" => Ok(EntryMode::Chat),
            other => Err(format!("unknown mode '{other}', expected 'form' or 'chat'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub phase: Phase,
    pub notification: NotificationStatus,
}

/// Wires the intake validator, notifier, content source and chat runtime
/// into the per-action handlers.
pub struct ChatFlow {
    validator: ProfileValidator,
    notifier: Arc<dyn Notifier>,
    sources: Arc<dyn ContentSource>,
    runtime: ChatRuntime,
    require_notification: bool,
}

impl ChatFlow {
    pub fn new(
        validator: ProfileValidator,
        notifier: Arc<dyn Notifier>,
        sources: Arc<dyn ContentSource>,
        runtime: ChatRuntime,
    ) -> Self {
        Self {
            validator,
            notifier,
            sources,
            runtime,
            require_notification: false,
        }
    }

    /// Keep the visitor in intake when the notification cannot be delivered.
    pub fn with_require_notification(mut self, require: bool) -> Self {
        self.require_notification = require;
        self
    }

    pub fn runtime(&self) -> &ChatRuntime {
        &self.runtime
    }

    #[instrument(skip(self, session), fields(session = %session.id))]
    pub fn choose(&self, session: &mut ChatSession, mode: EntryMode) -> Result<Phase, FlowError> {
        let action = match mode {
            EntryMode::Form => Action::ChooseForm,
            EntryMode::Chat => Action::ChooseChat,
        };
        let next = target(session, action)?;
        self.enter(session, next);
        Ok(next)
    }

    /// Validate and forward a profile. On a validation error (or a failed
    /// delivery when notification is required) the session is unchanged.
    #[instrument(skip(self, session, profile), fields(session = %session.id))]
    pub async fn submit(
        &self,
        session: &mut ChatSession,
        profile: Profile,
    ) -> Result<SubmitOutcome, FlowError> {
        let next = target(session, Action::Submit)?;
        if let Err(e) = self.validator.validate(&profile) {
            info!("profile rejected: {e}");
            return Err(e.into());
        }

        info!(channel = self.notifier.channel_type(), "sending profile notification");
        let notification = match self.notifier.notify(&profile).await {
            Ok(()) => NotificationStatus::Sent,
            Err(e) => {
                warn!("profile notification failed: {e}");
                if self.require_notification {
                    return Err(FlowError::Notification(e.to_string()));
                }
                NotificationStatus::Failed
            }
        };

        session.profile = Some(profile);
        self.enter(session, next);
        Ok(SubmitOutcome {
            phase: next,
            notification,
        })
    }

    #[instrument(skip(self, session), fields(session = %session.id))]
    pub fn skip(&self, session: &mut ChatSession) -> Result<Phase, FlowError> {
        let next = target(session, Action::Skip)?;
        self.enter(session, next);
        Ok(next)
    }

    /// Answer one question and append the resulting turn.
    ///
    /// Greetings are answered locally without touching the content source
    /// or the completion service.
    #[instrument(skip(self, session, text), fields(session = %session.id))]
    pub async fn ask(&self, session: &mut ChatSession, text: &str) -> Result<ChatTurn, FlowError> {
        target(session, Action::Ask)?;
        let question = text.trim();
        if question.is_empty() {
            return Err(FlowError::EmptyMessage);
        }

        let turn = match self.runtime.greeting_reply(question) {
            Some(turn) => turn,
            None => {
                let sources = self.sources_for(session).await;
                self.runtime
                    .answer(question, &sources, &session.turns)
                    .await
            }
        };

        session.turns.push(turn.clone());
        debug!(turns = session.turns.len(), outcome = ?turn.outcome, "turn appended");
        Ok(turn)
    }

    async fn sources_for(&self, session: &mut ChatSession) -> Arc<SourceContent> {
        if let Some(cached) = &session.sources {
            return Arc::clone(cached);
        }
        let loaded = Arc::new(self.sources.load().await);
        info!(
            document_chars = loaded.document_text.len(),
            page_chars = loaded.page_text.len(),
            "source content cached for session"
        );
        session.sources = Some(Arc::clone(&loaded));
        loaded
    }

    fn enter(&self, session: &mut ChatSession, next: Phase) {
        if session.phase != next {
            info!(from = %session.phase, to = %next, "phase transition");
        }
        session.phase = next;
    }
}

fn target(session: &ChatSession, action: Action) -> Result<Phase, FlowError> {
    next_phase(session.phase, action).ok_or(FlowError::InvalidTransition {
        phase: session.phase,
        action: action.as_str(),
    })
}
