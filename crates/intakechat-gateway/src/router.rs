use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use intakechat_common::{Error, Result};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::SharedState;

/// Build the application router with all routes.
///
/// Requests are rate limited per peer IP, so the router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`. The returned task
/// prunes limiter state and should be aborted when the server stops.
pub fn build_router(state: SharedState) -> Result<(Router, JoinHandle<()>)> {
    let rl = &state.config.gateway.rate_limit;
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rl.per_second)
        .burst_size(rl.burst_size)
        .finish()
        .ok_or_else(|| {
            Error::Config(format!(
                "invalid rate limit: per_second={}, burst={}",
                rl.per_second, rl.burst_size
            ))
        })?;
    let governor_limiter = governor_conf.limiter().clone();
    let governor_layer = GovernorLayer::new(governor_conf);

    // Forget limiter state for peers that have gone quiet.
    let pruner = tokio::spawn(async move {
        let interval = Duration::from_secs(60);
        loop {
            tokio::time::sleep(interval).await;
            governor_limiter.retain_recent();
        }
    });

    let router = Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/sessions", post(api::create_session))
        .route(
            "/api/sessions/{id}",
            get(api::get_session).delete(api::delete_session),
        )
        .route("/api/sessions/{id}/choose", post(api::choose))
        .route("/api/sessions/{id}/profile", post(api::submit_profile))
        .route("/api/sessions/{id}/skip", post(api::skip))
        .route("/api/sessions/{id}/messages", post(api::send_message))
        .route("/api/sessions/{id}/history", get(api::session_history))
        .with_state(state)
        .layer(governor_layer)
        .layer(TraceLayer::new_for_http());
    Ok((router, pruner))
}

async fn health() -> &'static str {
    "ok"
}

async fn status(State(state): State<SharedState>) -> axum::Json<Value> {
    let relay = state.flow.runtime().relay();
    let provider = relay.provider();
    let healthy = relay.health_check().await;

    axum::Json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions.len(),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "start_phase": state.config.intake.start_phase,
        "llm": {
            "provider": provider.provider_id(),
            "model": relay.model(),
            "healthy": healthy,
        },
    }))
}
