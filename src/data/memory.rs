use crate::domain::error::DomainError;
use crate::domain::repository::IdentityRepository;
use crate::domain::session::{Identity, Session};
use crate::infrastructure::security::{hash_password, verify_password};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace, warn};
use uuid::Uuid;

// Mirrors the hosted service's wording so local runs behave like production.
const DUPLICATE_USER_MESSAGE: &str =
    "A user with the same id, email, or phone already exists in this project.";
const INVALID_CREDENTIALS_MESSAGE: &str =
    "Invalid credentials. Please check the email and password.";
const SESSION_LIFETIME_DAYS: i64 = 365;

#[derive(Debug, Clone)]
struct StoredIdentity {
    identity: Identity,
    password_hash: String,
}

/// In-process stand-in for the hosted identity service. Keeps argon2
/// hashes only, keyed by email.
#[derive(Clone)]
pub struct InMemoryIdentityRepository {
    storage: Arc<RwLock<HashMap<String, StoredIdentity>>>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryIdentityRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    #[instrument(skip(self, password), fields(user_id = id, email = email))]
    async fn create_identity(
        &self,
        id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Identity> {
        let password_hash = hash_password(password)
            .map_err(|e| DomainError::Internal(format!("Failed to hash password: {}", e)))?;

        trace!("Acquiring write lock for identity storage");
        let mut storage = self.storage.write().await;
        if storage.contains_key(email) || storage.values().any(|s| s.identity.id == id) {
            warn!("Identity already exists");
            return Err(DomainError::remote(Some(409), DUPLICATE_USER_MESSAGE).into());
        }

        let identity = Identity {
            id: id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
        };
        storage.insert(
            email.to_string(),
            StoredIdentity {
                identity: identity.clone(),
                password_hash,
            },
        );
        debug!("Identity saved to memory storage");
        Ok(identity)
    }

    #[instrument(skip(self, password), fields(email = email))]
    async fn create_session(&self, email: &str, password: &str) -> Result<Session> {
        let stored = {
            let storage = self.storage.read().await;
            storage.get(email).cloned()
        };
        let stored = stored.ok_or_else(|| {
            trace!("No identity for email");
            DomainError::remote(Some(401), INVALID_CREDENTIALS_MESSAGE)
        })?;

        let valid = verify_password(password, &stored.password_hash)
            .map_err(|e| DomainError::Internal(format!("Failed to verify password: {}", e)))?;
        if !valid {
            trace!(user_id = %stored.identity.id, "Password mismatch");
            return Err(DomainError::remote(Some(401), INVALID_CREDENTIALS_MESSAGE).into());
        }

        let expire = (Utc::now() + Duration::days(SESSION_LIFETIME_DAYS))
            .to_rfc3339_opts(SecondsFormat::Millis, false);
        let session = Session {
            id: Uuid::new_v4().simple().to_string(),
            user_id: stored.identity.id,
            expire,
            provider: "email".to_string(),
            secret: None,
        };
        debug!(session_id = %session.id, user_id = %session.user_id, "Session created");
        Ok(session)
    }
}
