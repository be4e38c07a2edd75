// libs/reminder-cell/src/models.rs
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appointment_cell::models::Appointment;

/// Contact fields of the owning user, as embedded by the store join.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContactInfo {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ContactInfo {
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    pub fn has_contact(&self) -> bool {
        self.email().is_some() || self.phone().is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentWithContact {
    #[serde(flatten)]
    pub appointment: Appointment,
    #[serde(default)]
    pub users: Option<ContactInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationChannel {
    Email,
    Sms,
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationChannel::Email => write!(f, "email"),
            NotificationChannel::Sms => write!(f, "sms"),
        }
    }
}

/// One reminder rendered for every channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderMessage {
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub ok: bool,
    pub processed_count: usize,
    pub emails_sent: usize,
    pub sms_sent: usize,
    pub skipped: usize,
    pub failures: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("Failed to read appointments: {0}")]
    Store(String),

    #[error("{channel} provider error: {message}")]
    Provider {
        channel: NotificationChannel,
        message: String,
    },
}
