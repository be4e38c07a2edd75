use std::env;
use chrono::{FixedOffset, NaiveDateTime, Offset, Utc};
use tracing::warn;

pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 15;
pub const DEFAULT_RESEND_BASE_URL: &str = "https://api.resend.com";
pub const DEFAULT_TWILIO_BASE_URL: &str = "https://api.twilio.com";
pub const DEFAULT_REMINDER_EMAIL_FROM: &str = "Centro Médico <notificaciones@tuservidor.com>";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_api_key: String,
    pub session_secret: String,
    pub session_ttl_minutes: i64,
    pub cron_secret: String,
    pub resend_api_key: String,
    pub resend_base_url: String,
    pub reminder_email_from: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_phone_number: String,
    pub twilio_base_url: String,
    pub clinic_utc_offset_minutes: i32,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_api_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .or_else(|_| env::var("SUPABASE_ANON_PUBLIC_KEY"))
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY / SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            session_secret: env::var("SESSION_SECRET")
                .or_else(|_| env::var("SUPABASE_JWT_SECRET"))
                .unwrap_or_else(|_| {
                    warn!("SESSION_SECRET not set, using empty value");
                    String::new()
                }),
            session_ttl_minutes: parse_var("SESSION_TTL_MINUTES", DEFAULT_SESSION_TTL_MINUTES),
            cron_secret: env::var("CRON_SECRET")
                .unwrap_or_else(|_| {
                    warn!("CRON_SECRET not set, reminder sweep endpoint is unprotected");
                    String::new()
                }),
            resend_api_key: env::var("RESEND_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("RESEND_API_KEY not set, email reminders disabled");
                    String::new()
                }),
            resend_base_url: env::var("RESEND_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_RESEND_BASE_URL.to_string()),
            reminder_email_from: env::var("REMINDER_EMAIL_FROM")
                .unwrap_or_else(|_| DEFAULT_REMINDER_EMAIL_FROM.to_string()),
            twilio_account_sid: env::var("TWILIO_SID")
                .unwrap_or_else(|_| {
                    warn!("TWILIO_SID not set, SMS reminders disabled");
                    String::new()
                }),
            twilio_auth_token: env::var("TWILIO_AUTH").unwrap_or_default(),
            twilio_phone_number: env::var("TWILIO_PHONE").unwrap_or_default(),
            twilio_base_url: env::var("TWILIO_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_TWILIO_BASE_URL.to_string()),
            clinic_utc_offset_minutes: parse_var("CLINIC_UTC_OFFSET_MINUTES", 0),
            port: parse_var("PORT", 3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_api_key.is_empty()
            && !self.session_secret.is_empty()
    }

    pub fn is_email_configured(&self) -> bool {
        !self.resend_api_key.is_empty() && !self.resend_base_url.is_empty()
    }

    pub fn is_sms_configured(&self) -> bool {
        !self.twilio_account_sid.is_empty()
            && !self.twilio_auth_token.is_empty()
            && !self.twilio_phone_number.is_empty()
    }

    /// Offset of the clinic's wall clock from UTC. Out-of-range values fall back to UTC.
    pub fn clinic_offset(&self) -> FixedOffset {
        self.clinic_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                warn!("CLINIC_UTC_OFFSET_MINUTES out of range ({}), using UTC", self.clinic_utc_offset_minutes);
                Utc.fix()
            })
    }

    /// Current wall-clock time at the clinic.
    pub fn clinic_now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.clinic_offset()).naive_local()
    }
}

fn parse_var<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
