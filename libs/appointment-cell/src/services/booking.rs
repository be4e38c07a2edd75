// libs/appointment-cell/src/services/booking.rs
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    parse_time_of_day, Appointment, AppointmentChanges, AppointmentError, AppointmentStatus,
    AppointmentSummary, ConflictCheckQuery, CreateAppointmentRequest, UpdateAppointmentRequest,
};
use crate::services::lifecycle::AppointmentLifecycleService;

const APPOINTMENTS_PATH: &str = "/rest/v1/appointments";

/// Store-backed create/list/reschedule/cancel. `acting_owner` scopes an
/// operation to one user; `None` is reserved for internal callers.
pub struct AppointmentBookingService {
    supabase: SupabaseClient,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            lifecycle_service: AppointmentLifecycleService::new(),
        }
    }

    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        acting_owner: Option<Uuid>,
    ) -> Result<Appointment, AppointmentError> {
        let new_appointment = request.validate()?;

        if acting_owner.is_some_and(|owner| owner != new_appointment.owner_id) {
            warn!("Rejected booking on behalf of another user ({})", new_appointment.owner_id);
            return Err(AppointmentError::Unauthorized);
        }

        info!("Creating appointment for owner {} with {} on {} {}",
              new_appointment.owner_id, new_appointment.provider, new_appointment.date, new_appointment.time);

        let now = Utc::now().to_rfc3339();
        let appointment_data = json!({
            "owner_id": new_appointment.owner_id,
            "specialty": new_appointment.specialty,
            "provider": new_appointment.provider,
            "date": new_appointment.date.format("%Y-%m-%d").to_string(),
            "time": new_appointment.time,
            "location": new_appointment.location,
            "status": AppointmentStatus::Scheduled.to_string(),
            "created_at": now,
            "updated_at": now
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            APPOINTMENTS_PATH,
            None,
            Some(appointment_data),
            Some(SupabaseClient::return_representation()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointment = first_row(result)?
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to create appointment".to_string()))?;

        info!("Appointment {} created", appointment.id);
        Ok(appointment)
    }

    pub async fn list_appointments(
        &self,
        owner_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut path = format!("{}?select=*&order=date.asc,time.asc", APPOINTMENTS_PATH);
        if let Some(owner_id) = owner_id {
            path.push_str(&format!("&owner_id=eq.{}", owner_id));
        }

        debug!("Listing appointments: {}", path);
        self.fetch(&path).await
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        acting_owner: Option<Uuid>,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("{}?id=eq.{}", APPOINTMENTS_PATH, appointment_id);
        let appointment = self.fetch(&path).await?
            .into_iter()
            .next()
            .ok_or(AppointmentError::NotFound)?;

        if acting_owner.is_some_and(|owner| owner != appointment.owner_id) {
            warn!("User {:?} is not the owner of appointment {}", acting_owner, appointment_id);
            return Err(AppointmentError::Unauthorized);
        }

        Ok(appointment)
    }

    /// Apply only the fields present in `request`; status moves only on an explicit override.
    pub async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
        acting_owner: Option<Uuid>,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Rescheduling appointment: {}", appointment_id);

        let changes = request.validate()?;
        let current = self.get_appointment(appointment_id, acting_owner).await?;

        if let Some(new_status) = &changes.status {
            self.lifecycle_service.validate_status_transition(&current.status, new_status)?;
        }

        let update_data = self.build_update(&current, &changes);
        let updated = self.patch(appointment_id, update_data).await?;

        info!("Appointment {} updated", appointment_id);
        Ok(updated)
    }

    /// Soft-cancel. Applies regardless of current status, so repeating it is harmless.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        reason: Option<String>,
        acting_owner: Option<Uuid>,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Cancelling appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id, acting_owner).await?;
        if current.status == AppointmentStatus::Cancelled {
            debug!("Appointment {} already cancelled, re-applying reason", appointment_id);
        }

        let reason = self.lifecycle_service.cancellation_reason(reason);
        let update_data = json!({
            "status": AppointmentStatus::Cancelled.to_string(),
            "cancellation_reason": reason,
            "updated_at": Utc::now().to_rfc3339()
        });

        let cancelled = self.patch(appointment_id, update_data).await?;

        info!("Appointment {} cancelled: {}", appointment_id, reason);
        Ok(cancelled)
    }

    /// Other scheduled bookings for the same provider and slot. Advisory only.
    pub async fn find_conflicts(
        &self,
        query: &ConflictCheckQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let slot = parse_time_of_day(&query.time).ok_or_else(|| {
            AppointmentError::ValidationError(format!("Invalid time (expected HH:MM): {}", query.time))
        })?;

        let path = format!(
            "{}?select=*&provider=eq.{}&date=eq.{}",
            APPOINTMENTS_PATH,
            urlencoding::encode(query.provider.trim()),
            query.date.format("%Y-%m-%d")
        );

        let conflicts: Vec<Appointment> = self.fetch(&path).await?
            .into_iter()
            .filter(|apt| apt.status == AppointmentStatus::Scheduled)
            .filter(|apt| Some(apt.id) != query.exclude_id)
            .filter(|apt| parse_time_of_day(&apt.time) == Some(slot))
            .collect();

        if !conflicts.is_empty() {
            warn!("{} existing booking(s) for {} on {} at {}",
                  conflicts.len(), query.provider, query.date, query.time);
        }

        Ok(conflicts)
    }

    pub async fn get_summary(
        &self,
        owner_id: Uuid,
        today: NaiveDate,
    ) -> Result<AppointmentSummary, AppointmentError> {
        let appointments = self.list_appointments(Some(owner_id)).await?;
        Ok(self.lifecycle_service.summarize(appointments, today))
    }

    pub async fn record_reminder_sent(
        &self,
        appointment_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Recording reminder for appointment {}", appointment_id);
        self.patch(appointment_id, json!({ "reminder_sent_at": sent_at.to_rfc3339() })).await
    }

    fn build_update(&self, current: &Appointment, changes: &AppointmentChanges) -> Value {
        let mut update_data = serde_json::Map::new();

        if let Some(specialty) = &changes.specialty {
            update_data.insert("specialty".to_string(), json!(specialty));
        }
        if let Some(provider) = &changes.provider {
            update_data.insert("provider".to_string(), json!(provider));
        }
        if let Some(date) = &changes.date {
            update_data.insert("date".to_string(), json!(date.format("%Y-%m-%d").to_string()));
        }
        if let Some(time) = &changes.time {
            update_data.insert("time".to_string(), json!(time));
        }
        if let Some(location) = &changes.location {
            update_data.insert("location".to_string(), json!(location));
        }
        if let Some(status) = &changes.status {
            update_data.insert("status".to_string(), json!(status.to_string()));
            if *status == AppointmentStatus::Cancelled {
                let reason = self.lifecycle_service.cancellation_reason(current.cancellation_reason.clone());
                update_data.insert("cancellation_reason".to_string(), json!(reason));
            }
        }

        // A reminder sent for the old slot says nothing about the new one.
        if changes.touches_schedule() && current.reminder_sent_at.is_some() {
            update_data.insert("reminder_sent_at".to_string(), Value::Null);
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        Value::Object(update_data)
    }

    async fn fetch(&self, path: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            path,
            None,
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e)))
    }

    async fn patch(&self, appointment_id: Uuid, update_data: Value) -> Result<Appointment, AppointmentError> {
        let path = format!("{}?id=eq.{}", APPOINTMENTS_PATH, appointment_id);

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            None,
            Some(update_data),
            Some(SupabaseClient::return_representation()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        // Row vanished between read and write.
        first_row(result)?.ok_or(AppointmentError::NotFound)
    }
}

fn first_row(rows: Vec<Value>) -> Result<Option<Appointment>, AppointmentError> {
    rows.into_iter()
        .next()
        .map(|row| {
            serde_json::from_value(row)
                .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
        })
        .transpose()
}
