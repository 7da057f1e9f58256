//! Configured users and password verification

use crate::{WebError, WebResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use gatekeeper_applications::{auth::identity::split_level_username, IdentityProvider};
use gatekeeper_core::{AccessLevel, Principal, UserConfig};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct UserRecord {
    password_hash: String,
    max_level: AccessLevel,
}

/// Argon2-backed identity provider over the configured user table
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: HashMap<String, UserRecord>,
}

impl CredentialStore {
    /// Load users, hashing any plain passwords once up front
    pub fn from_config(users: &[UserConfig]) -> WebResult<Self> {
        let mut records = HashMap::new();

        for user in users {
            let password_hash = match (&user.password_hash, &user.password) {
                (Some(hash), _) => {
                    PasswordHash::new(hash).map_err(|e| {
                        WebError::Config(format!("Invalid password hash for '{}': {}", user.name, e))
                    })?;
                    hash.clone()
                }
                (None, Some(password)) => hash_password(password)?,
                (None, None) => {
                    return Err(WebError::Config(format!(
                        "User '{}' has no password",
                        user.name
                    )))
                }
            };

            records.insert(
                user.name.clone(),
                UserRecord {
                    password_hash,
                    max_level: user.max_level,
                },
            );
        }

        info!("Loaded {} users", records.len());
        Ok(Self { users: records })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl IdentityProvider for CredentialStore {
    async fn authenticate(&self, username: &str, password: &str) -> Option<Principal> {
        let (level, name) = split_level_username(username)?;
        let record = self.users.get(name)?;

        // Argon2 verification blocks; run it off the async workers
        let password = password.to_string();
        let hash = record.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .unwrap_or(false);

        if !verified {
            debug!(user = name, "Password mismatch");
            return None;
        }
        if level > record.max_level {
            debug!(user = name, requested = %level, "Requested level above user maximum");
            return None;
        }

        Some(Principal::new(name, level))
    }
}

/// Hash password using Argon2
pub fn hash_password(password: &str) -> WebResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| WebError::Auth(format!("Failed to hash password: {}", e)))
}

/// Verify password against a PHC hash string
fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
