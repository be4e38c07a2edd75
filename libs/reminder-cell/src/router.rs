// libs/reminder-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use shared_utils::extractor::cron_secret_middleware;
use shared_utils::state::AppState;

use crate::handlers;

pub fn reminder_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/reminder-sweep", get(handlers::run_reminder_sweep))
        .layer(middleware::from_fn_with_state(state.clone(), cron_secret_middleware))
        .with_state(state)
}
