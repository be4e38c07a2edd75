// libs/appointment-cell/src/services/lifecycle.rs
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::models::{
    Appointment, AppointmentError, AppointmentStats, AppointmentStatus, AppointmentSummary,
    AppointmentView,
};

/// Days of notice required before a patient may still edit an appointment.
pub const EDIT_WINDOW_DAYS: i64 = 7;

pub const DEFAULT_CANCELLATION_REASON: &str = "Cancelada por el usuario";

pub struct AppointmentLifecycleService;

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate an explicit status override. Re-asserting the current status is a no-op.
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {:?} to {:?}", current_status, new_status);

        if current_status == new_status {
            return Ok(());
        }

        if !self.get_valid_transitions(current_status).contains(new_status) {
            warn!("Invalid status transition attempted: {:?} -> {:?}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: *current_status,
                to: *new_status,
            });
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled => vec![
                AppointmentStatus::Attended,
                AppointmentStatus::NoShow,
                AppointmentStatus::Cancelled,
            ],
            // Terminal for user-initiated overrides
            AppointmentStatus::Attended
            | AppointmentStatus::Cancelled
            | AppointmentStatus::NoShow => vec![],
        }
    }

    /// Advisory edit window: still scheduled and more than a week away.
    pub fn is_editable(&self, appointment: &Appointment, today: NaiveDate) -> bool {
        appointment.status == AppointmentStatus::Scheduled
            && (appointment.date - today).num_days() > EDIT_WINDOW_DAYS
    }

    pub fn is_upcoming(&self, appointment: &Appointment, today: NaiveDate) -> bool {
        appointment.status == AppointmentStatus::Scheduled && appointment.date >= today
    }

    pub fn summarize(&self, appointments: Vec<Appointment>, today: NaiveDate) -> AppointmentSummary {
        let mut stats = AppointmentStats::default();
        let mut upcoming = Vec::new();
        let mut history = Vec::new();

        for appointment in appointments {
            stats.total += 1;
            match appointment.status {
                AppointmentStatus::Scheduled => stats.scheduled += 1,
                AppointmentStatus::Attended => stats.attended += 1,
                AppointmentStatus::Cancelled => stats.cancelled += 1,
                AppointmentStatus::NoShow => stats.no_show += 1,
            }

            let view = AppointmentView {
                editable: self.is_editable(&appointment, today),
                appointment,
            };

            if self.is_upcoming(&view.appointment, today) {
                upcoming.push(view);
            } else {
                history.push(view);
            }
        }

        upcoming.sort_by(|a, b| {
            (a.appointment.date, &a.appointment.time).cmp(&(b.appointment.date, &b.appointment.time))
        });
        history.sort_by(|a, b| {
            (b.appointment.date, &b.appointment.time).cmp(&(a.appointment.date, &a.appointment.time))
        });

        AppointmentSummary { upcoming, history, stats }
    }

    pub fn cancellation_reason(&self, reason: Option<String>) -> String {
        reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_CANCELLATION_REASON.to_string())
    }
}
