//! HTTP handlers for the `/api/debug/*` routes.
//!
//! All state-mutating endpoints are POST. Non-2xx is reserved for malformed
//! input (400) and unrecoverable server faults (500); domain failures such
//! as a rejected compile or an unknown session return 200 with
//! `success:false` instead.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use trace_engine::{CompilerConfig, EngineError, EngineLimits, SessionError, SessionManager};

pub struct AppState {
    pub manager: SessionManager,
}

impl AppState {
    #[must_use]
    pub fn new(limits: EngineLimits, compiler: CompilerConfig) -> Self {
        Self { manager: SessionManager::new(limits, compiler) }
    }
}

pub type SharedState = Arc<AppState>;

#[derive(Deserialize)]
pub struct StartRequest {
    code: Option<String>,
    language: Option<String>,
}

#[derive(Deserialize)]
pub struct SessionIdRequest {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

#[derive(Deserialize)]
pub struct GetStateRequest {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
    step: Option<i64>,
}

pub async fn start(State(state): State<SharedState>, Json(req): Json<StartRequest>) -> (StatusCode, Json<JsonValue>) {
    let Some(code) = req.code.filter(|c| !c.is_empty()) else {
        return validation_error("missing \"code\"");
    };
    let Some(language) = req.language else {
        return validation_error("missing \"language\"");
    };
    if language != "cpp" && language != "c" {
        return validation_error(&format!("unsupported language \"{language}\" (must be \"cpp\" or \"c\")"));
    }

    match state.manager.start_session(code) {
        Ok(started) => {
            tracing::info!(session_id = %started.session_id, total_steps = started.total_steps, "session started");
            success(json!({
                "success": true,
                "sessionId": started.session_id,
                "totalSteps": started.total_steps,
                "initialState": started.initial_state.to_json(),
            }))
        }
        Err(err) => {
            tracing::warn!(error = %err, "start_session failed");
            error_response(&err)
        }
    }
}

pub async fn step_forward(State(state): State<SharedState>, Json(req): Json<SessionIdRequest>) -> (StatusCode, Json<JsonValue>) {
    let Some(session_id) = req.session_id.filter(|s| !s.is_empty()) else {
        return validation_error("missing \"sessionId\"");
    };
    match state.manager.step_forward(&session_id) {
        Ok(outcome) => {
            tracing::info!(session_id = %session_id, step = outcome.step, "step-forward");
            success(json!({
                "success": true,
                "state": outcome.state.to_json(),
                "step": outcome.step,
                "totalSteps": outcome.total_steps,
                "atEnd": outcome.at_end,
            }))
        }
        Err(err) => error_response(&err),
    }
}

pub async fn step_backward(State(state): State<SharedState>, Json(req): Json<SessionIdRequest>) -> (StatusCode, Json<JsonValue>) {
    let Some(session_id) = req.session_id.filter(|s| !s.is_empty()) else {
        return validation_error("missing \"sessionId\"");
    };
    match state.manager.step_backward(&session_id) {
        Ok(outcome) => {
            tracing::info!(session_id = %session_id, step = outcome.step, "step-backward");
            success(json!({
                "success": true,
                "state": outcome.state.to_json(),
                "step": outcome.step,
                "totalSteps": outcome.total_steps,
                "atStart": outcome.at_start,
            }))
        }
        Err(err) => error_response(&err),
    }
}

pub async fn get_state(State(state): State<SharedState>, Json(req): Json<GetStateRequest>) -> (StatusCode, Json<JsonValue>) {
    let Some(session_id) = req.session_id.filter(|s| !s.is_empty()) else {
        return validation_error("missing \"sessionId\"");
    };
    let Some(step) = req.step else {
        return validation_error("missing \"step\"");
    };
    match state.manager.get_state(&session_id, step) {
        Ok(outcome) => success(json!({
            "success": true,
            "state": outcome.state.to_json(),
            "step": outcome.step,
            "totalSteps": outcome.total_steps,
        })),
        Err(err) => error_response(&err),
    }
}

pub async fn end(State(state): State<SharedState>, Json(req): Json<SessionIdRequest>) -> (StatusCode, Json<JsonValue>) {
    let Some(session_id) = req.session_id.filter(|s| !s.is_empty()) else {
        return validation_error("missing \"sessionId\"");
    };
    let existed = state.manager.end_session(&session_id);
    tracing::info!(session_id = %session_id, existed, "end_session");
    if !existed {
        return (StatusCode::OK, Json(json!({ "success": false, "error": "Session Not Found" })));
    }
    success(json!({ "success": true }))
}

fn success(body: JsonValue) -> (StatusCode, Json<JsonValue>) {
    (StatusCode::OK, Json(body))
}

fn validation_error(details: &str) -> (StatusCode, Json<JsonValue>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "success": false, "error": "Validation Error", "details": details })))
}

fn error_response(err: &EngineError) -> (StatusCode, Json<JsonValue>) {
    match err {
        EngineError::Session(SessionError::StepOutOfRange { step, total_steps }) => validation_error(&format!(
            "step {step} out of range for trace of {total_steps} states"
        )),
        EngineError::Session(SessionError::NotFound) => (
            StatusCode::OK,
            Json(json!({ "success": false, "error": "Session Not Found" })),
        ),
        EngineError::Compile(compile_err) => (
            StatusCode::OK,
            Json(json!({ "success": false, "error": "Compilation Error", "details": compile_err.to_string() })),
        ),
        EngineError::Internal(details) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": "Debug Error", "details": details })),
        ),
    }
}
