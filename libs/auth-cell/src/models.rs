use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::auth::UserProfile;
use shared_models::error::AppError;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Documento o nombre incorrectos";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "document")]
    pub documento: Option<String>,
    #[serde(default, alias = "name")]
    pub nombre: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// What the caller proved they know. A password wins over a name when both are sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Credentials {
    Name(String),
    Password(String),
}

impl LoginRequest {
    pub fn into_credentials(self) -> Result<(String, Credentials), AuthError> {
        let document = non_blank(self.documento).ok_or(AuthError::MissingDocument)?;

        let credentials = match (non_blank(self.password), non_blank(self.nombre)) {
            (Some(password), _) => Credentials::Password(password),
            (None, Some(name)) => Credentials::Name(name),
            (None, None) => return Err(AuthError::MissingCredentials),
        };

        Ok((document, credentials))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserProfile,
    pub session: SessionToken,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing required field: documento")]
    MissingDocument,

    #[error("Missing credentials: nombre or password is required")]
    MissingCredentials,

    #[error("{}", INVALID_CREDENTIALS_MESSAGE)]
    InvalidCredentials,

    #[error("User directory error: {0}")]
    Directory(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingDocument | AuthError::MissingCredentials => AppError::BadRequest(err.to_string()),
            AuthError::InvalidCredentials => AppError::Auth(err.to_string()),
            AuthError::Directory(msg) => AppError::Database(msg),
        }
    }
}
