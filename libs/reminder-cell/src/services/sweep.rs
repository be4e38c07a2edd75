// libs/reminder-cell/src/services/sweep.rs
use chrono::{Duration, NaiveDateTime, Utc};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, warn};

use appointment_cell::models::{Appointment, AppointmentStatus};
use appointment_cell::services::booking::AppointmentBookingService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    AppointmentWithContact, ContactInfo, NotificationChannel, ReminderError, ReminderMessage, SweepReport,
};
use crate::services::notifier::{NotificationSender, ResendEmailSender, TwilioSmsSender};

pub const LOOKAHEAD_HOURS: i64 = 24;
pub const WINDOW_TOLERANCE_MINUTES: i64 = 60;

const APPOINTMENTS_WITH_CONTACT_PATH: &str =
    "/rest/v1/appointments?select=*,users(id,name,email,phone)";

/// True when `moment` lies within the tolerance of `now + 24h`, both ends included.
pub fn is_within_lookahead(moment: NaiveDateTime, now: NaiveDateTime) -> bool {
    let target = now + Duration::hours(LOOKAHEAD_HOURS);
    let tolerance = Duration::minutes(WINDOW_TOLERANCE_MINUTES);
    let diff = moment - target;
    diff >= -tolerance && diff <= tolerance
}

pub fn render_message(appointment: &Appointment, contact: &ContactInfo) -> ReminderMessage {
    let when = appointment
        .scheduled_moment()
        .map(|moment| moment.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| format!("{} {}", appointment.date, appointment.time));
    let greeting = contact.name.as_deref().unwrap_or("paciente");

    let html = format!(
        "<h2>Recordatorio de Cita</h2>\
         <p>Hola {greeting},</p>\
         <p>Este es un recordatorio de tu cita:</p>\
         <ul>\
         <li><strong>Doctor:</strong> {provider}</li>\
         <li><strong>Especialidad:</strong> {specialty}</li>\
         <li><strong>Fecha y hora:</strong> {when}</li>\
         <li><strong>Ubicacion:</strong> {location}</li>\
         </ul>\
         <p>Si no puedes asistir, por favor comunícate con el centro médico.</p>",
        greeting = greeting,
        provider = appointment.provider,
        specialty = appointment.specialty,
        when = when,
        location = appointment.location,
    );

    let text = format!(
        "Recordatorio: Tienes una cita con {} ({}) el {} en {}.",
        appointment.provider, appointment.specialty, when, appointment.location
    );

    ReminderMessage {
        subject: "Recordatorio de Cita Médica".to_string(),
        html,
        text,
    }
}

pub struct ReminderSweepService {
    supabase: SupabaseClient,
    booking_service: AppointmentBookingService,
    email_sender: Option<Box<dyn NotificationSender>>,
    sms_sender: Option<Box<dyn NotificationSender>>,
}

impl ReminderSweepService {
    pub fn new(config: &AppConfig) -> Self {
        let email_sender = ResendEmailSender::from_config(config)
            .map(|sender| Box::new(sender) as Box<dyn NotificationSender>);
        let sms_sender = TwilioSmsSender::from_config(config)
            .map(|sender| Box::new(sender) as Box<dyn NotificationSender>);

        Self::with_senders(config, email_sender, sms_sender)
    }

    pub fn with_senders(
        config: &AppConfig,
        email_sender: Option<Box<dyn NotificationSender>>,
        sms_sender: Option<Box<dyn NotificationSender>>,
    ) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            booking_service: AppointmentBookingService::new(config),
            email_sender,
            sms_sender,
        }
    }

    /// One pass over the store. `now` is the clinic's wall clock.
    pub async fn run(&self, now: NaiveDateTime) -> Result<SweepReport, ReminderError> {
        let appointments = self.fetch_with_contacts().await?;

        let selected: Vec<AppointmentWithContact> = appointments
            .into_iter()
            .filter(|row| {
                row.appointment
                    .scheduled_moment()
                    .is_some_and(|moment| is_within_lookahead(moment, now))
            })
            .collect();

        let mut report = SweepReport {
            ok: true,
            processed_count: selected.len(),
            ..Default::default()
        };
        info!("Reminder sweep at {}: {} appointment(s) in window", now, selected.len());

        for row in selected {
            self.notify(row, &mut report).await;
        }

        info!(
            "Reminder sweep done: {} email(s), {} SMS, {} skipped, {} failure(s)",
            report.emails_sent, report.sms_sent, report.skipped, report.failures
        );
        Ok(report)
    }

    async fn notify(&self, row: AppointmentWithContact, report: &mut SweepReport) {
        let appointment = row.appointment;

        if appointment.status != AppointmentStatus::Scheduled || appointment.reminder_sent_at.is_some() {
            debug!("Skipping appointment {} ({}, reminded: {})",
                   appointment.id, appointment.status, appointment.reminder_sent_at.is_some());
            report.skipped += 1;
            return;
        }

        let contact = row.users.unwrap_or_default();
        if !contact.has_contact() {
            debug!("Appointment {} has no contact method", appointment.id);
            report.skipped += 1;
            return;
        }

        let message = render_message(&appointment, &contact);

        let email = async {
            match (&self.email_sender, contact.email()) {
                (Some(sender), Some(to)) => Some((sender.channel(), sender.send(to, &message).await)),
                _ => None,
            }
        };
        let sms = async {
            match (&self.sms_sender, contact.phone()) {
                (Some(sender), Some(to)) => Some((sender.channel(), sender.send(to, &message).await)),
                _ => None,
            }
        };
        let (email_result, sms_result) = futures::join!(email, sms);

        if email_result.is_none() && sms_result.is_none() {
            debug!("No enabled channel for appointment {}", appointment.id);
            report.skipped += 1;
            return;
        }

        let mut delivered = false;
        for (channel, result) in [email_result, sms_result].into_iter().flatten() {
            match result {
                Ok(()) => {
                    match channel {
                        NotificationChannel::Email => report.emails_sent += 1,
                        NotificationChannel::Sms => report.sms_sent += 1,
                    }
                    delivered = true;
                }
                Err(e) => {
                    warn!("Reminder {} for appointment {} failed: {}", channel, appointment.id, e);
                    report.failures += 1;
                }
            }
        }

        if delivered {
            if let Err(e) = self.booking_service.record_reminder_sent(appointment.id, Utc::now()).await {
                warn!("Could not record reminder for appointment {}: {}", appointment.id, e);
                report.failures += 1;
            }
        }
    }

    async fn fetch_with_contacts(&self) -> Result<Vec<AppointmentWithContact>, ReminderError> {
        let rows: Vec<Value> = self.supabase
            .request(Method::GET, APPOINTMENTS_WITH_CONTACT_PATH, None, None)
            .await
            .map_err(|e| ReminderError::Store(e.to_string()))?;

        let appointments = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<AppointmentWithContact>(row) {
                Ok(appointment) => Some(appointment),
                Err(e) => {
                    warn!("Ignoring unreadable appointment row: {}", e);
                    None
                }
            })
            .collect();

        Ok(appointments)
    }
}
