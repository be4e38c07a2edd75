// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use shared_utils::extractor::session_middleware;
use shared_utils::state::AppState;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route(
            "/appointments",
            get(handlers::list_appointments)
                .post(handlers::create_appointment)
                .patch(handlers::update_appointment)
                .delete(handlers::cancel_appointment),
        )
        .route("/appointments/summary", get(handlers::get_summary))
        .route("/appointments/conflicts", get(handlers::check_conflicts))
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware));

    let public_routes = Router::new()
        .route("/appointment-data", get(handlers::get_booking_catalog));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .with_state(state)
}
