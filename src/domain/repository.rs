use crate::domain::session::{Identity, Session};
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;

/// Hosted auth service: accounts and sessions.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    async fn create_identity(
        &self,
        id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Identity>;
    async fn create_session(&self, email: &str, password: &str) -> Result<Session>;
}

/// Hosted document store holding one document per user.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: User) -> Result<User>;
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>>;
    /// Returns `None` when no document has this id.
    async fn update_user_name(&self, id: &str, name: &str) -> Result<Option<User>>;
    /// Returns `false` when no document has this id.
    async fn delete_user(&self, id: &str) -> Result<bool>;
}
