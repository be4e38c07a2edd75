// libs/reminder-cell/src/services/notifier.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

use crate::models::{NotificationChannel, ReminderError, ReminderMessage};

#[async_trait]
pub trait NotificationSender: Send + Sync {
    fn channel(&self) -> NotificationChannel;

    async fn send(&self, to: &str, message: &ReminderMessage) -> Result<(), ReminderError>;
}

fn provider_error(channel: NotificationChannel, message: impl Into<String>) -> ReminderError {
    ReminderError::Provider { channel, message: message.into() }
}

/// Transactional email through the Resend HTTP API.
pub struct ResendEmailSender {
    client: Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl ResendEmailSender {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.resend_base_url.trim_end_matches('/').to_string(),
            api_key: config.resend_api_key.clone(),
            from: config.reminder_email_from.clone(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Option<Self> {
        if !config.is_email_configured() {
            warn!("RESEND_API_KEY not set, email reminders disabled");
            return None;
        }
        Some(Self::new(config))
    }
}

#[async_trait]
impl NotificationSender for ResendEmailSender {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Email
    }

    async fn send(&self, to: &str, message: &ReminderMessage) -> Result<(), ReminderError> {
        let url = format!("{}/emails", self.base_url);
        debug!("Sending reminder email to {}", to);

        let response = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": message.subject,
                "html": message.html
            }))
            .send()
            .await
            .map_err(|e| provider_error(NotificationChannel::Email, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Resend API error ({}): {}", status, body);
            return Err(provider_error(NotificationChannel::Email, format!("{}: {}", status, body)));
        }

        Ok(())
    }
}

/// SMS through the Twilio Messages API.
pub struct TwilioSmsSender {
    client: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from: String,
}

impl TwilioSmsSender {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.twilio_base_url.trim_end_matches('/').to_string(),
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from: config.twilio_phone_number.clone(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Option<Self> {
        if !config.is_sms_configured() {
            warn!("Twilio credentials not set, SMS reminders disabled");
            return None;
        }
        Some(Self::new(config))
    }
}

#[async_trait]
impl NotificationSender for TwilioSmsSender {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Sms
    }

    async fn send(&self, to: &str, message: &ReminderMessage) -> Result<(), ReminderError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );
        debug!("Sending reminder SMS to {}", to);

        let params = [
            ("Body", message.text.as_str()),
            ("From", self.from.as_str()),
            ("To", to),
        ];

        let response = self.client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| provider_error(NotificationChannel::Sms, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Twilio API error ({}): {}", status, body);
            return Err(provider_error(NotificationChannel::Sms, format!("{}: {}", status, body)));
        }

        Ok(())
    }
}
