use std::sync::Arc;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Session, UserProfile};

use crate::jwt::issue_session_token;
use crate::state::AppState;

pub struct TestConfig {
    pub session_secret: String,
    pub supabase_url: String,
    pub supabase_api_key: String,
    pub cron_secret: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            session_secret: "test-secret-key-for-session-tokens-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_api_key: "test-service-key".to_string(),
            cron_secret: String::new(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_api_key: self.supabase_api_key.clone(),
            session_secret: self.session_secret.clone(),
            session_ttl_minutes: 15,
            cron_secret: self.cron_secret.clone(),
            resend_api_key: String::new(),
            resend_base_url: String::new(),
            reminder_email_from: "Centro Médico <test@example.com>".to_string(),
            twilio_account_sid: String::new(),
            twilio_auth_token: String::new(),
            twilio_phone_number: String::new(),
            twilio_base_url: String::new(),
            clinic_utc_offset_minutes: 0,
            port: 3000,
        }
    }

    pub fn to_state(&self) -> Arc<AppState> {
        Arc::new(AppState::new(self.to_app_config()))
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub document: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("12345", "Juan Perez")
    }
}

impl TestUser {
    pub fn new(document: &str, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            document: document.to_string(),
            name: name.to_string(),
            email: Some("paciente@example.com".to_string()),
            phone: Some("+573001234567".to_string()),
        }
    }

    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            document: self.document.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            password_hash: None,
        }
    }
}

pub struct SessionTestUtils;

impl SessionTestUtils {
    /// Starts and registers a session for `user`, returning its bearer token.
    pub async fn login(state: &AppState, user: &TestUser) -> String {
        let now = Utc::now();
        let session = Session::start(&user.to_profile(), now, Duration::minutes(15));
        state.sessions.register(&session, now).await;
        issue_session_token(&session, &state.config.session_secret)
            .expect("session secret is configured in tests")
    }

    /// Signed token whose session ended an hour ago.
    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        let issued = Utc::now() - Duration::hours(2);
        let session = Session::start(&user.to_profile(), issued, Duration::hours(1));
        issue_session_token(&session, secret).expect("non-empty secret")
    }

    /// Valid signature, but never registered.
    pub fn create_unregistered_token(user: &TestUser, secret: &str) -> String {
        let session = Session::start(&user.to_profile(), Utc::now(), Duration::minutes(15));
        issue_session_token(&session, secret).expect("non-empty secret")
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn user_response(user: &TestUser) -> serde_json::Value {
        json!({
            "id": user.id,
            "document": user.document,
            "name": user.name,
            "email": user.email,
            "phone": user.phone,
            "password_hash": null
        })
    }

    pub fn appointment_response(
        id: Uuid,
        owner_id: Uuid,
        date: &str,
        time: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "owner_id": owner_id,
            "specialty": "Cardiología",
            "provider": "Dr. Soto",
            "date": date,
            "time": time,
            "location": "Consultorio 101",
            "status": status,
            "cancellation_reason": null,
            "reminder_sent_at": null,
            "created_at": "2025-11-01T00:00:00Z",
            "updated_at": "2025-11-01T00:00:00Z"
        })
    }

    pub fn appointment_with_user(appointment: serde_json::Value, user: Option<&TestUser>) -> serde_json::Value {
        let mut row = appointment;
        row["users"] = match user {
            Some(user) => json!({
                "id": user.id,
                "name": user.name,
                "email": user.email,
                "phone": user.phone
            }),
            None => serde_json::Value::Null,
        };
        row
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
