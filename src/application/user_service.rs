use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{UpdateUserRequest, User};
use crate::domain::validation::ensure_valid;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Pass-through CRUD over the user documents.
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users = self.users.list_users().await?;
        info!(count = users.len(), "Users listed");
        Ok(users)
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: &str) -> Result<User> {
        self.users
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| not_found(id).into())
    }

    #[instrument(skip(self, req))]
    pub async fn update_user(&self, id: &str, req: UpdateUserRequest) -> Result<User> {
        ensure_valid(&req)?;
        let user = self
            .users
            .update_user_name(id, &req.name)
            .await?
            .ok_or_else(|| not_found(id))?;
        info!(user_id = %user.id, "User name updated");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: &str) -> Result<()> {
        if !self.users.delete_user(id).await? {
            return Err(not_found(id).into());
        }
        info!(user_id = id, "User deleted");
        Ok(())
    }
}

fn not_found(id: &str) -> DomainError {
    warn!(user_id = id, "User not found");
    DomainError::NotFound(format!("User not found: {}", id))
}
