use argon2::{Argon2, PasswordHash, PasswordVerifier};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::UserProfile;

use crate::models::{AuthError, Credentials};

/// Looks users up in the hosted directory and checks what they claim to know.
pub struct UserDirectoryService {
    supabase: SupabaseClient,
}

impl UserDirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Several users may share a document number; the first whose credentials match wins.
    pub async fn authenticate(
        &self,
        document: &str,
        credentials: &Credentials,
    ) -> Result<UserProfile, AuthError> {
        let candidates = self.find_by_document(document).await?;
        debug!("{} directory entries for document {}", candidates.len(), document);

        let user = candidates
            .into_iter()
            .find(|user| credentials_match(user, credentials))
            .ok_or_else(|| {
                warn!("Failed login for document {}", document);
                AuthError::InvalidCredentials
            })?;

        info!("User {} authenticated", user.id);
        Ok(user)
    }

    pub async fn find_by_document(&self, document: &str) -> Result<Vec<UserProfile>, AuthError> {
        let path = format!(
            "/rest/v1/users?select=*&document=eq.{}",
            urlencoding::encode(document)
        );

        let rows: Vec<Value> = self.supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AuthError::Directory(e.to_string()))?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<UserProfile>, _>>()
            .map_err(|e| AuthError::Directory(format!("Failed to parse users: {}", e)))
    }
}

fn credentials_match(user: &UserProfile, credentials: &Credentials) -> bool {
    match credentials {
        Credentials::Name(name) => user.name.trim().to_lowercase() == name.to_lowercase(),
        Credentials::Password(password) => user
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(password, hash)),
    }
}

/// Malformed stored hashes count as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password hash is not a valid PHC string: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
