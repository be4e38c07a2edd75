// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::Session;
use shared_models::error::AppError;
use shared_utils::state::AppState;

use crate::models::{
    AppointmentIdQuery, AppointmentQueryParams, AppointmentSummary, BookedSlot, BookingCatalog,
    CancelAppointmentRequest, ConflictCheckQuery, ConflictCheckResponse, CreateAppointmentRequest,
    SummaryQuery, UpdateAppointmentRequest,
};
use crate::services::booking::AppointmentBookingService;
use crate::services::catalog::booking_catalog;

/// Requests default to the session user; naming anyone else is refused.
fn resolve_owner(session: &Session, requested: Option<Uuid>) -> Result<Uuid, AppError> {
    match requested {
        Some(owner_id) if owner_id != session.user_id => Err(AppError::Forbidden(
            "Not authorized to access appointments of another user".to_string(),
        )),
        _ => Ok(session.user_id),
    }
}

fn require_id(id: Option<Uuid>) -> Result<Uuid, AppError> {
    id.ok_or_else(|| AppError::BadRequest("Missing appointment id".to_string()))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(params): Query<AppointmentQueryParams>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state.config);

    if let Some(appointment_id) = params.id {
        let appointment = booking_service
            .get_appointment(appointment_id, Some(session.user_id))
            .await?;
        return Ok(Json(json!(appointment)));
    }

    let owner_id = resolve_owner(&session, params.owner_id)?;
    let appointments = booking_service.list_appointments(Some(owner_id)).await?;

    debug!("Returning {} appointments for {}", appointments.len(), owner_id);
    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let booking_service = AppointmentBookingService::new(&state.config);

    let appointment = booking_service
        .create_appointment(request, Some(session.user_id))
        .await?;

    Ok((StatusCode::CREATED, Json(json!({
        "ok": true,
        "data": [appointment]
    }))))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(params): Query<AppointmentIdQuery>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = require_id(params.id)?;
    let booking_service = AppointmentBookingService::new(&state.config);

    let appointment = booking_service
        .reschedule_appointment(appointment_id, request, Some(session.user_id))
        .await?;

    Ok(Json(json!({
        "ok": true,
        "data": [appointment]
    })))
}

/// Reason comes from an optional JSON body, falling back to `?reason=`.
#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(params): Query<AppointmentIdQuery>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let appointment_id = require_id(params.id)?;

    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CancelAppointmentRequest::default()
    } else {
        serde_json::from_slice::<CancelAppointmentRequest>(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    let booking_service = AppointmentBookingService::new(&state.config);
    let appointment = booking_service
        .cancel_appointment(appointment_id, request.reason.or(params.reason), Some(session.user_id))
        .await?;

    Ok(Json(json!({
        "ok": true,
        "data": [appointment]
    })))
}

#[axum::debug_handler]
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(params): Query<SummaryQuery>,
) -> Result<Json<AppointmentSummary>, AppError> {
    let owner_id = resolve_owner(&session, params.owner_id)?;
    let today = state.config.clinic_now().date();

    let booking_service = AppointmentBookingService::new(&state.config);
    let summary = booking_service.get_summary(owner_id, today).await?;

    Ok(Json(summary))
}

#[axum::debug_handler]
pub async fn check_conflicts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConflictCheckQuery>,
) -> Result<Json<ConflictCheckResponse>, AppError> {
    let booking_service = AppointmentBookingService::new(&state.config);
    let conflicts = booking_service.find_conflicts(&query).await?;

    Ok(Json(ConflictCheckResponse {
        has_conflict: !conflicts.is_empty(),
        conflicts: conflicts.into_iter().map(BookedSlot::from).collect(),
    }))
}

pub async fn get_booking_catalog() -> Json<BookingCatalog> {
    Json(booking_catalog())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};
    use shared_models::auth::UserProfile;

    fn session_for(user_id: Uuid) -> Session {
        let profile = UserProfile {
            id: user_id,
            document: "12345".to_string(),
            name: "Juan Perez".to_string(),
            email: None,
            phone: None,
            password_hash: None,
        };
        Session::start(&profile, Utc::now(), Duration::minutes(15))
    }

    #[test]
    fn test_resolve_owner() {
        let user_id = Uuid::new_v4();
        let session = session_for(user_id);

        assert_eq!(resolve_owner(&session, None).unwrap(), user_id);
        assert_eq!(resolve_owner(&session, Some(user_id)).unwrap(), user_id);
        assert_matches!(resolve_owner(&session, Some(Uuid::new_v4())), Err(AppError::Forbidden(_)));
    }

    #[test]
    fn test_require_id() {
        assert_matches!(require_id(None), Err(AppError::BadRequest(_)));
    }
}
