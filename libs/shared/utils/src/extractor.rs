use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
    body::Body,
};
use chrono::Utc;
use headers::{authorization::Bearer, Authorization, HeaderMapExt};
use http::header::AUTHORIZATION;
use tracing::{debug, warn};

use shared_models::auth::Session;
use shared_models::error::AppError;

use crate::jwt::validate_session_token;
use crate::state::AppState;

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    if !headers.contains_key(AUTHORIZATION) {
        return Err(AppError::Auth("Missing authorization header".to_string()));
    }

    match headers.typed_get::<Authorization<Bearer>>() {
        Some(auth) if !auth.token().is_empty() => Ok(auth.token().to_string()),
        _ => Err(AppError::Auth("Invalid authorization header format".to_string())),
    }
}

// Validates the session token, checks it is still registered and attaches the Session.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())?;
    let now = Utc::now();

    let session = validate_session_token(&token, &state.config.session_secret, now)
        .map_err(AppError::Auth)?;

    if !state.sessions.is_active(session.id, now).await {
        debug!("Session {} is not registered (logged out or expired)", session.id);
        return Err(AppError::Auth("Session is no longer active".to_string()));
    }

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

// Guards cron-triggered endpoints with the shared CRON_SECRET when one is configured.
pub async fn cron_secret_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let expected = &state.config.cron_secret;
    if expected.is_empty() {
        return Ok(next.run(request).await);
    }

    let token = extract_bearer_token(request.headers())?;
    if token != *expected {
        warn!("Rejected cron request with invalid secret");
        return Err(AppError::Auth("Invalid cron secret".to_string()));
    }

    Ok(next.run(request).await)
}

pub fn extract_session<B>(request: &Request<B>) -> Result<Session, AppError> {
    request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Auth("Session not found in request extensions".to_string()))
}
