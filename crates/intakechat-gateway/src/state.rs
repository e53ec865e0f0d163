use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use intakechat_common::SessionId;
use intakechat_config::AppConfig;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

use crate::flow::ChatFlow;
use crate::session::{ChatSession, SessionSummary};

pub type SharedState = Arc<AppState>;

/// Sessions are locked individually so one visitor's actions run one at a
/// time without blocking anyone else.
pub type SessionHandle = Arc<Mutex<ChatSession>>;

/// Shared gateway state: configuration, the visitor flow, and live sessions.
pub struct AppState {
    pub config: AppConfig,
    pub flow: ChatFlow,
    pub sessions: DashMap<SessionId, SessionHandle>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, flow: ChatFlow) -> Self {
        Self {
            config,
            flow,
            sessions: DashMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Open a session in the configured start phase.
    pub fn open_session(&self) -> SessionSummary {
        let session = ChatSession::new(self.config.intake.start_phase);
        let summary = session.summary();
        info!(session = %session.id, phase = %session.phase, "session created");
        self.sessions
            .insert(session.id.clone(), Arc::new(Mutex::new(session)));
        summary
    }

    /// Lock a live session and mark it active. Returns `None` if the session
    /// is unknown or was removed while waiting for the lock.
    pub async fn lock_session(&self, id: &SessionId) -> Option<OwnedMutexGuard<ChatSession>> {
        let handle = self.sessions.get(id).map(|entry| Arc::clone(entry.value()))?;
        let mut session = handle.lock_owned().await;
        if !self.sessions.contains_key(id) {
            return None;
        }
        session.touch();
        Some(session)
    }

    pub fn remove_session(&self, id: &SessionId) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            info!(session = %id, "session discarded");
        }
        removed
    }

    /// Drop sessions idle for longer than `max_idle`. Sessions with an
    /// action in flight are never considered idle.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.idle_for() < max_idle,
            Err(_) => true,
        });
        let swept = before.saturating_sub(self.sessions.len());
        if swept > 0 {
            info!(swept, remaining = self.sessions.len(), "idle sessions expired");
        }
        swept
    }

    /// Periodically expire idle sessions.
    pub fn spawn_session_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let state = Arc::clone(self);
        let max_idle = state.config.gateway.session_idle();
        let period = (max_idle / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                state.sweep_idle(max_idle);
            }
        })
    }
}
