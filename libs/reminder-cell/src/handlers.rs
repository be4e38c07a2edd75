// libs/reminder-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use shared_utils::state::AppState;

use crate::services::sweep::ReminderSweepService;

/// Cron entry point. A failed store read is the only error that fails the sweep.
#[axum::debug_handler]
pub async fn run_reminder_sweep(State(state): State<Arc<AppState>>) -> Response {
    let sweep = ReminderSweepService::new(&state.config);

    match sweep.run(state.config.clinic_now()).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!("Reminder sweep failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
