// libs/appointment-cell/src/models.rs
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub specialty: String,
    pub provider: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub reminder_sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Appointment {
    /// Local wall-clock moment of the appointment, if the stored time parses.
    pub fn scheduled_moment(&self) -> Option<NaiveDateTime> {
        parse_time_of_day(&self.time).map(|time| self.date.and_time(time))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[serde(alias = "Scheduled", alias = "Programada")]
    Scheduled,
    #[serde(alias = "Attended", alias = "Asistida")]
    Attended,
    #[serde(alias = "Cancelled", alias = "Cancelada")]
    Cancelled,
    #[serde(alias = "NoShow", alias = "No Asistida")]
    NoShow,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Attended => write!(f, "attended"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

/// Accepts `HH:MM` and the `HH:MM:SS` form the store returns.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    #[serde(default, alias = "owner_id")]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
}

/// Partial update. Owner fields in the body are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub owner_id: Uuid,
    pub specialty: String,
    pub provider: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentChanges {
    pub specialty: Option<String>,
    pub provider: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentChanges {
    pub fn touches_schedule(&self) -> bool {
        self.date.is_some() || self.time.is_some()
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, AppointmentError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppointmentError::ValidationError(format!("Missing required field: {}", field))),
    }
}

fn optional(value: Option<String>, field: &str) -> Result<Option<String>, AppointmentError> {
    match value {
        None => Ok(None),
        Some(v) => required(Some(v), field).map(Some),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppointmentError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppointmentError::ValidationError(format!("Invalid date (expected YYYY-MM-DD): {}", raw)))
}

fn normalize_time(raw: &str) -> Result<String, AppointmentError> {
    parse_time_of_day(raw)
        .map(|time| time.format("%H:%M").to_string())
        .ok_or_else(|| AppointmentError::ValidationError(format!("Invalid time (expected HH:MM): {}", raw)))
}

impl CreateAppointmentRequest {
    pub fn validate(self) -> Result<NewAppointment, AppointmentError> {
        let owner_id = required(self.owner_id, "ownerId")?;
        let specialty = required(self.specialty, "specialty")?;
        let provider = required(self.provider, "provider")?;
        let date = required(self.date, "date")?;
        let time = required(self.time, "time")?;
        let location = required(self.location, "location")?;

        if let Some(status) = self.status {
            if status != AppointmentStatus::Scheduled {
                return Err(AppointmentError::ValidationError(format!(
                    "New appointments must be scheduled, got {}", status
                )));
            }
        }

        let owner_id = Uuid::parse_str(&owner_id)
            .map_err(|_| AppointmentError::ValidationError(format!("Invalid ownerId: {}", owner_id)))?;

        Ok(NewAppointment {
            owner_id,
            specialty,
            provider,
            date: parse_date(&date)?,
            time: normalize_time(&time)?,
            location,
        })
    }
}

impl UpdateAppointmentRequest {
    pub fn validate(self) -> Result<AppointmentChanges, AppointmentError> {
        let changes = AppointmentChanges {
            specialty: optional(self.specialty, "specialty")?,
            provider: optional(self.provider, "provider")?,
            date: optional(self.date, "date")?.as_deref().map(parse_date).transpose()?,
            time: optional(self.time, "time")?.as_deref().map(normalize_time).transpose()?,
            location: optional(self.location, "location")?,
            status: self.status,
        };

        if changes == AppointmentChanges::default() {
            return Err(AppointmentError::ValidationError("No updatable fields provided".to_string()));
        }

        Ok(changes)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentQueryParams {
    pub id: Option<Uuid>,
    #[serde(alias = "owner_id")]
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelAppointmentRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentIdQuery {
    pub id: Option<Uuid>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    #[serde(alias = "owner_id")]
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckQuery {
    pub provider: String,
    pub date: NaiveDate,
    pub time: String,
    #[serde(alias = "exclude_id")]
    pub exclude_id: Option<Uuid>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub editable: bool,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStats {
    pub total: usize,
    pub scheduled: usize,
    pub attended: usize,
    pub cancelled: usize,
    pub no_show: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentSummary {
    pub upcoming: Vec<AppointmentView>,
    pub history: Vec<AppointmentView>,
    pub stats: AppointmentStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    pub conflicts: Vec<BookedSlot>,
}

/// Slot-level view of a clashing booking; carries nothing about its owner.
#[derive(Debug, Clone, Serialize)]
pub struct BookedSlot {
    pub id: Uuid,
    pub provider: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
}

impl From<Appointment> for BookedSlot {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            provider: appointment.provider,
            date: appointment.date,
            time: appointment.time,
            location: appointment.location,
        }
    }
}

/// Specialty groups -> specialty -> providers, plus bookable rooms and slots.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCatalog {
    pub groups: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    pub locations: Vec<String>,
    pub time_slots: Vec<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Not authorized to access this appointment")]
    Unauthorized,

    #[error("{0}")]
    ValidationError(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: AppointmentStatus, to: AppointmentStatus },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::Unauthorized => AppError::Forbidden(err.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::InvalidStatusTransition { .. } => AppError::ValidationError(err.to_string()),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
