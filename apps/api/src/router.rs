use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use reminder_cell::router::reminder_routes;
use shared_utils::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic appointments API is running!" }))
        .merge(auth_routes(state.clone()))
        .merge(appointment_routes(state.clone()))
        .merge(reminder_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use shared_utils::test_utils::TestConfig;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_liveness() {
        let app = create_router(TestConfig::default().to_state());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Clinic appointments API is running!");
    }

    #[tokio::test]
    async fn test_all_cells_are_mounted() {
        let app = create_router(TestConfig::default().to_state());

        for (verb, uri) in [("GET", "/appointments"), ("GET", "/session"), ("POST", "/logout")] {
            let request = Request::builder().method(verb).uri(uri).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", verb, uri);
        }

        let request = Request::builder().uri("/appointment-data").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
