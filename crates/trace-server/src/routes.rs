//! Route table.

use std::sync::Arc;

use axum::{Router, routing::post};

use crate::handlers::{self, AppState};

#[must_use]
pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/debug/start", post(handlers::start))
        .route("/api/debug/step-forward", post(handlers::step_forward))
        .route("/api/debug/step-backward", post(handlers::step_backward))
        .route("/api/debug/get-state", post(handlers::get_state))
        .route("/api/debug/end", post(handlers::end))
        .with_state(state)
}
