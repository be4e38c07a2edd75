use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_models::auth::{Session, SessionResponse};
use shared_models::error::AppError;
use shared_utils::jwt::issue_session_token;
use shared_utils::state::AppState;

use crate::models::{LoginRequest, LoginResponse, SessionToken};
use crate::services::directory::UserDirectoryService;

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (document, credentials) = request.into_credentials()?;
    debug!("Login attempt for document {}", document);

    let directory = UserDirectoryService::new(&state.config);
    let user = directory.authenticate(&document, &credentials).await?;

    let now = Utc::now();
    let session = Session::start(&user, now, Duration::minutes(state.config.session_ttl_minutes));
    let token = issue_session_token(&session, &state.config.session_secret)
        .map_err(AppError::Internal)?;

    state.sessions.register(&session, now).await;
    info!("Session {} started for user {}", session.id, user.id);

    Ok(Json(LoginResponse {
        success: true,
        user,
        session: SessionToken {
            token,
            expires_at: session.expires_at,
        },
    }))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    if state.sessions.revoke(session.id).await {
        info!("Session {} closed for user {}", session.id, session.user_id);
    }

    Ok(Json(json!({ "success": true })))
}

#[axum::debug_handler]
pub async fn session_info(
    Extension(session): Extension<Session>,
) -> Json<SessionResponse> {
    Json(SessionResponse::from_session(&session, Utc::now()))
}
