use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

/// Claims carried inside a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub sid: Uuid,
    pub name: String,
    pub document: String,
    pub iat: i64,
    pub exp: i64,
}

/// A row of the user directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub document: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
}

/// Login context attached to every authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub document: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn start(user: &UserProfile, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user.id,
            name: user.name.clone(),
            document: user.document.clone(),
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whole seconds left before expiry, never negative.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    pub fn to_claims(&self) -> SessionClaims {
        SessionClaims {
            sub: self.user_id,
            sid: self.id,
            name: self.name.clone(),
            document: self.document.clone(),
            iat: self.issued_at.timestamp(),
            exp: self.expires_at.timestamp(),
        }
    }

    pub fn from_claims(claims: SessionClaims) -> Option<Self> {
        Some(Self {
            id: claims.sid,
            user_id: claims.sub,
            name: claims.name,
            document: claims.document,
            issued_at: DateTime::from_timestamp(claims.iat, 0)?,
            expires_at: DateTime::from_timestamp(claims.exp, 0)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub name: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub remaining_seconds: i64,
}

impl SessionResponse {
    pub fn from_session(session: &Session, now: DateTime<Utc>) -> Self {
        Self {
            user_id: session.user_id,
            name: session.name.clone(),
            issued_at: session.issued_at,
            expires_at: session.expires_at,
            remaining_seconds: session.remaining_seconds(now),
        }
    }
}
