use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use intakechat_common::{Profile, SessionId};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::OwnedMutexGuard;

use crate::flow::{EntryMode, FlowError};
use crate::session::ChatSession;
use crate::state::SharedState;

type ApiResponse = (StatusCode, Json<Value>);

#[derive(Deserialize)]
pub struct ChooseRequest {
    pub mode: String,
}

/// Profile form body. Every field defaults to empty so that missing input
/// is reported by the validator rather than by JSON decoding.
#[derive(Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "contact_number")]
    pub phone: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl From<ProfileRequest> for Profile {
    fn from(req: ProfileRequest) -> Self {
        Profile {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_string(),
            phone: req.phone.trim().to_string(),
            fields: req.fields,
        }
    }
}

/// A missing `text` is treated as empty and rejected by the flow.
#[derive(Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub text: String,
}

/// POST /api/sessions
pub async fn create_session(State(state): State<SharedState>) -> ApiResponse {
    let summary = state.open_session();
    (
        StatusCode::CREATED,
        Json(json!({
            "session_id": summary.session_id,
            "phase": summary.phase,
        })),
    )
}

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResponse {
    let session = match lookup(&state, id).await {
        Ok(session) => session,
        Err(e) => return error_response(&e),
    };
    (StatusCode::OK, Json(json!(session.summary())))
}

/// DELETE /api/sessions/{id}
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResponse {
    if !state.remove_session(&SessionId::from(id)) {
        return error_response(&FlowError::UnknownSession);
    }
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// POST /api/sessions/{id}/choose
pub async fn choose(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<ChooseRequest>,
) -> ApiResponse {
    let mode: EntryMode = match body.mode.parse() {
        Ok(mode) => mode,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": message })),
            );
        }
    };
    let mut session = match lookup(&state, id).await {
        Ok(session) => session,
        Err(e) => return error_response(&e),
    };
    match state.flow.choose(&mut session, mode) {
        Ok(phase) => (StatusCode::OK, Json(json!({ "phase": phase }))),
        Err(e) => error_response(&e),
    }
}

/// POST /api/sessions/{id}/profile
pub async fn submit_profile(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<ProfileRequest>,
) -> ApiResponse {
    let mut session = match lookup(&state, id).await {
        Ok(session) => session,
        Err(e) => return error_response(&e),
    };
    match state.flow.submit(&mut session, body.into()).await {
        Ok(outcome) => (StatusCode::OK, Json(json!(outcome))),
        Err(e) => {
            let (status, Json(mut body)) = error_response(&e);
            body["phase"] = json!(session.phase);
            (status, Json(body))
        }
    }
}

/// POST /api/sessions/{id}/skip
pub async fn skip(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResponse {
    let mut session = match lookup(&state, id).await {
        Ok(session) => session,
        Err(e) => return error_response(&e),
    };
    match state.flow.skip(&mut session) {
        Ok(phase) => (StatusCode::OK, Json(json!({ "phase": phase }))),
        Err(e) => error_response(&e),
    }
}

/// POST /api/sessions/{id}/messages: answer one question and return the new turn.
pub async fn send_message(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<MessageRequest>,
) -> ApiResponse {
    let mut session = match lookup(&state, id).await {
        Ok(session) => session,
        Err(e) => return error_response(&e),
    };
    let result = state.flow.ask(&mut session, &body.text).await;
    session.touch();
    match result {
        Ok(turn) => (StatusCode::OK, Json(json!(turn))),
        Err(e) => error_response(&e),
    }
}

/// GET /api/sessions/{id}/history
pub async fn session_history(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResponse {
    let session = match lookup(&state, id).await {
        Ok(session) => session,
        Err(e) => return error_response(&e),
    };
    (
        StatusCode::OK,
        Json(json!({
            "session_id": session.id,
            "phase": session.phase,
            "turns": session.turns,
        })),
    )
}

async fn lookup(
    state: &SharedState,
    id: String,
) -> Result<OwnedMutexGuard<ChatSession>, FlowError> {
    state
        .lock_session(&SessionId::from(id))
        .await
        .ok_or(FlowError::UnknownSession)
}

fn error_response(err: &FlowError) -> ApiResponse {
    let status = match err {
        FlowError::InvalidTransition { .. } => StatusCode::CONFLICT,
        FlowError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FlowError::Notification(_) => StatusCode::BAD_GATEWAY,
        FlowError::EmptyMessage => StatusCode::BAD_REQUEST,
        FlowError::UnknownSession => StatusCode::NOT_FOUND,
    };

    let mut body = json!({
        "status": "error",
        "message": err.to_string(),
    });
    if let FlowError::Validation(validation) = err {
        if let (Ok(Value::Object(detail)), Some(obj)) =
            (serde_json::to_value(validation), body.as_object_mut())
        {
            obj.extend(detail);
        }
    }
    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use intakechat_common::Phase;
    use intakechat_security::ValidationError;

    #[test]
    fn validation_errors_carry_kind_and_field() {
        let (status, Json(body)) = error_response(&FlowError::Validation(
            ValidationError::MissingField("email".to_string()),
        ));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "missing_field");
        assert_eq!(body["field"], "email");
    }

    #[test]
    fn invalid_transition_is_conflict() {
        let (status, Json(body)) = error_response(&FlowError::InvalidTransition {
            phase: Phase::Chat,
            action: "skip",
        });
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "cannot skip while in chat phase");
    }

    #[test]
    fn profile_request_trims_identity_fields() {
        let req: ProfileRequest = serde_json::from_value(json!({
            "name": "  Ana ",
            "contact_number": "+12345678901",
        }))
        .unwrap();
        let profile = Profile::from(req);
        assert_eq!(profile.name, "Ana");
        assert_eq!(profile.phone, "+12345678901");
        assert!(profile.email.is_empty());
    }
}
