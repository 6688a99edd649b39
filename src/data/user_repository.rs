use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace, warn};

const DOCUMENT_EXISTS_MESSAGE: &str =
    "Document with the requested ID already exists. Try again with a different ID or use ID.unique() to generate a unique ID.";

/// In-process stand-in for the hosted document collection.
#[derive(Clone)]
pub struct InMemoryUserRepository {
    storage: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self), fields(user_id = %user.id, email = %user.email))]
    async fn create_user(&self, user: User) -> Result<User> {
        let mut user = user;
        trace!("Acquiring write lock for user storage");
        let mut storage = self.storage.write().await;
        if storage.contains_key(&user.id) {
            warn!("Document id already taken");
            return Err(DomainError::remote(Some(409), DOCUMENT_EXISTS_MESSAGE).into());
        }
        let now = Utc::now();
        user.created_at = Some(now);
        user.updated_at = Some(now);
        storage.insert(user.id.clone(), user.clone());
        debug!("User saved to memory storage");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<User>> {
        let storage = self.storage.read().await;
        let mut users: Vec<User> = storage.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        debug!(count = users.len(), "Listed users from memory storage");
        Ok(users)
    }

    #[instrument(skip(self), fields(user_id = id))]
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let storage = self.storage.read().await;
        let user = storage.get(id).cloned();
        if user.is_none() {
            trace!("User not found in storage");
        }
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = id))]
    async fn update_user_name(&self, id: &str, name: &str) -> Result<Option<User>> {
        let mut storage = self.storage.write().await;
        let Some(user) = storage.get_mut(id) else {
            trace!("User not found in storage");
            return Ok(None);
        };
        user.name = name.to_string();
        user.updated_at = Some(Utc::now());
        debug!("User name updated in memory storage");
        Ok(Some(user.clone()))
    }

    #[instrument(skip(self), fields(user_id = id))]
    async fn delete_user(&self, id: &str) -> Result<bool> {
        let mut storage = self.storage.write().await;
        let removed = storage.remove(id).is_some();
        debug!(removed, "Delete processed in memory storage");
        Ok(removed)
    }
}
