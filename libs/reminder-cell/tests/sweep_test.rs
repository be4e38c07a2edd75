use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reminder_cell::models::{NotificationChannel, ReminderError, ReminderMessage, SweepReport};
use reminder_cell::services::notifier::NotificationSender;
use reminder_cell::services::sweep::ReminderSweepService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

type Outbox = Arc<Mutex<Vec<(String, ReminderMessage)>>>;

struct RecordingSender {
    channel: NotificationChannel,
    outbox: Outbox,
    fail: bool,
}

impl RecordingSender {
    fn boxed(channel: NotificationChannel, outbox: &Outbox, fail: bool) -> Option<Box<dyn NotificationSender>> {
        Some(Box::new(Self { channel, outbox: outbox.clone(), fail }))
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    fn channel(&self) -> NotificationChannel {
        self.channel
    }

    async fn send(&self, to: &str, message: &ReminderMessage) -> Result<(), ReminderError> {
        if self.fail {
            return Err(ReminderError::Provider {
                channel: self.channel,
                message: "provider unavailable".to_string(),
            });
        }
        self.outbox.lock().unwrap().push((to.to_string(), message.clone()));
        Ok(())
    }
}

fn sweep_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 11, 14).unwrap().and_hms_opt(10, 0, 0).unwrap()
}

fn row(user: Option<&TestUser>, date: &str, time: &str, status: &str) -> Value {
    let owner_id = user.map(|u| u.id).unwrap_or_else(Uuid::new_v4);
    MockSupabaseResponses::appointment_with_user(
        MockSupabaseResponses::appointment_response(Uuid::new_v4(), owner_id, date, time, status),
        user,
    )
}

async fn mount_store(mock_server: &MockServer, rows: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("select", "*,users(id,name,email,phone)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(rows)))
        .mount(mock_server)
        .await;
}

async fn mount_marker(mock_server: &MockServer, status: u16) {
    let body = json!([MockSupabaseResponses::appointment_response(
        Uuid::new_v4(), Uuid::new_v4(), "2025-11-15", "10:00", "scheduled"
    )]);
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(mock_server)
        .await;
}

async fn marker_writes(mock_server: &MockServer) -> Vec<Value> {
    mock_server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == "PATCH")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

struct Harness {
    mock_server: MockServer,
    emails: Outbox,
    sms: Outbox,
}

impl Harness {
    async fn start() -> Self {
        Self {
            mock_server: MockServer::start().await,
            emails: Outbox::default(),
            sms: Outbox::default(),
        }
    }

    fn service(&self, email_fails: bool, sms_fails: bool) -> ReminderSweepService {
        let config = TestConfig::with_supabase_url(self.mock_server.uri()).to_app_config();
        ReminderSweepService::with_senders(
            &config,
            RecordingSender::boxed(NotificationChannel::Email, &self.emails, email_fails),
            RecordingSender::boxed(NotificationChannel::Sms, &self.sms, sms_fails),
        )
    }
}

#[tokio::test]
async fn test_sweep_sends_email_and_sms_for_appointment_in_window() {
    let harness = Harness::start().await;
    let user = TestUser::default();

    mount_store(&harness.mock_server, vec![
        row(Some(&user), "2025-11-15", "10:00:00", "scheduled"),
        row(Some(&user), "2025-11-15", "11:01:00", "scheduled"),
        row(Some(&user), "2025-11-15", "08:59:00", "scheduled"),
        row(Some(&user), "2025-11-20", "10:00:00", "scheduled"),
    ]).await;
    mount_marker(&harness.mock_server, 200).await;

    let report = harness.service(false, false).run(sweep_now()).await.unwrap();

    assert_eq!(report, SweepReport {
        ok: true,
        processed_count: 1,
        emails_sent: 1,
        sms_sent: 1,
        skipped: 0,
        failures: 0,
    });

    let emails = harness.emails.lock().unwrap();
    assert_eq!(emails[0].0, "paciente@example.com");
    assert_eq!(emails[0].1.subject, "Recordatorio de Cita Médica");
    assert!(emails[0].1.html.contains("Hola Juan Perez"));
    assert!(emails[0].1.html.contains("2025-11-15 10:00"));

    let sms = harness.sms.lock().unwrap();
    assert_eq!(sms[0].0, "+573001234567");
    assert_eq!(
        sms[0].1.text,
        "Recordatorio: Tienes una cita con Dr. Soto (Cardiología) el 2025-11-15 10:00 en Consultorio 101."
    );

    let writes = marker_writes(&harness.mock_server).await;
    assert_eq!(writes.len(), 1);
    assert!(writes[0]["reminder_sent_at"].is_string());
}

#[tokio::test]
async fn test_window_edges_are_inclusive() {
    let harness = Harness::start().await;
    let user = TestUser::default();

    mount_store(&harness.mock_server, vec![
        row(Some(&user), "2025-11-15", "09:00:00", "scheduled"),
        row(Some(&user), "2025-11-15", "11:00:00", "scheduled"),
    ]).await;
    mount_marker(&harness.mock_server, 200).await;

    let report = harness.service(false, false).run(sweep_now()).await.unwrap();

    assert_eq!(report.processed_count, 2);
    assert_eq!(report.emails_sent, 2);
}

#[tokio::test]
async fn test_already_reminded_and_cancelled_are_skipped() {
    let harness = Harness::start().await;
    let user = TestUser::default();

    let mut reminded = row(Some(&user), "2025-11-15", "10:00:00", "scheduled");
    reminded["reminder_sent_at"] = json!("2025-11-14T09:00:00Z");

    mount_store(&harness.mock_server, vec![
        reminded,
        row(Some(&user), "2025-11-15", "10:30:00", "cancelled"),
    ]).await;

    let report = harness.service(false, false).run(sweep_now()).await.unwrap();

    assert_eq!(report.processed_count, 2);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.emails_sent + report.sms_sent, 0);
    assert!(marker_writes(&harness.mock_server).await.is_empty());
}

#[tokio::test]
async fn test_missing_contact_is_skipped_silently() {
    let harness = Harness::start().await;
    let mut user = TestUser::default();
    user.email = None;
    user.phone = None;

    mount_store(&harness.mock_server, vec![
        row(Some(&user), "2025-11-15", "10:00:00", "scheduled"),
        row(None, "2025-11-15", "10:00:00", "scheduled"),
    ]).await;

    let report = harness.service(false, false).run(sweep_now()).await.unwrap();

    assert_eq!(report.processed_count, 2);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failures, 0);
}

#[tokio::test]
async fn test_email_only_user_gets_only_email() {
    let harness = Harness::start().await;
    let mut user = TestUser::default();
    user.phone = None;

    mount_store(&harness.mock_server, vec![row(Some(&user), "2025-11-15", "10:00:00", "scheduled")]).await;
    mount_marker(&harness.mock_server, 200).await;

    let report = harness.service(false, false).run(sweep_now()).await.unwrap();

    assert_eq!(report.emails_sent, 1);
    assert_eq!(report.sms_sent, 0);
    assert!(harness.sms.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_send_does_not_abort_sweep() {
    let harness = Harness::start().await;
    let user = TestUser::default();

    mount_store(&harness.mock_server, vec![
        row(Some(&user), "2025-11-15", "10:00:00", "scheduled"),
        row(Some(&user), "2025-11-15", "10:30:00", "scheduled"),
    ]).await;
    mount_marker(&harness.mock_server, 200).await;

    let report = harness.service(true, false).run(sweep_now()).await.unwrap();

    assert_eq!(report.processed_count, 2);
    assert_eq!(report.emails_sent, 0);
    assert_eq!(report.sms_sent, 2);
    assert_eq!(report.failures, 2);
    assert_eq!(marker_writes(&harness.mock_server).await.len(), 2);
}

#[tokio::test]
async fn test_nothing_delivered_leaves_marker_unset() {
    let harness = Harness::start().await;
    let user = TestUser::default();

    mount_store(&harness.mock_server, vec![row(Some(&user), "2025-11-15", "10:00:00", "scheduled")]).await;

    let report = harness.service(true, true).run(sweep_now()).await.unwrap();

    assert_eq!(report.failures, 2);
    assert!(marker_writes(&harness.mock_server).await.is_empty());
}

#[tokio::test]
async fn test_marker_write_failure_is_counted() {
    let harness = Harness::start().await;
    let user = TestUser::default();

    mount_store(&harness.mock_server, vec![row(Some(&user), "2025-11-15", "10:00:00", "scheduled")]).await;
    mount_marker(&harness.mock_server, 500).await;

    let report = harness.service(false, false).run(sweep_now()).await.unwrap();

    assert_eq!(report.emails_sent, 1);
    assert_eq!(report.sms_sent, 1);
    assert_eq!(report.failures, 1);
}

#[tokio::test]
async fn test_disabled_channels_skip_appointment() {
    let harness = Harness::start().await;
    let user = TestUser::default();
    mount_store(&harness.mock_server, vec![row(Some(&user), "2025-11-15", "10:00:00", "scheduled")]).await;

    let config = TestConfig::with_supabase_url(harness.mock_server.uri()).to_app_config();
    let report = ReminderSweepService::new(&config).run(sweep_now()).await.unwrap();

    assert_eq!(report.processed_count, 1);
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn test_store_read_failure_fails_sweep() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .mount(&harness.mock_server)
        .await;

    let result = harness.service(false, false).run(sweep_now()).await;

    assert_matches!(result, Err(ReminderError::Store(msg)) if msg.contains("db down"));
}
