use crate::domain::error::DomainError;
use crate::domain::repository::{IdentityRepository, UserRepository};
use crate::domain::session::Session;
use crate::domain::user::{LoginRequest, SignupRequest, User};
use crate::domain::validation::ensure_valid;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub struct AuthService {
    identities: Arc<dyn IdentityRepository>,
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(identities: Arc<dyn IdentityRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { identities, users }
    }

    /// Creates the remote account, then its user document under the same id.
    ///
    /// The two calls are not atomic. When the document write fails the
    /// account is left behind; its id is logged and the remote error returned.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn signup(&self, req: SignupRequest) -> Result<User> {
        trace!("Starting signup");
        ensure_valid(&req).inspect_err(|e| warn!(error = %e, "Rejected signup request"))?;

        let id = Uuid::new_v4().simple().to_string();
        let identity = self
            .identities
            .create_identity(&id, &req.email, &req.password, &req.name)
            .await?;
        debug!(user_id = %identity.id, "Remote account created");

        let user = self
            .users
            .create_user(User::new(identity.id.clone(), req.email, req.name))
            .await
            .inspect_err(|e| {
                error!(
                    user_id = %identity.id,
                    error = %e,
                    "User document creation failed; remote account left without a document"
                )
            })?;

        info!(user_id = %user.id, email = %user.email, "User signed up");
        Ok(user)
    }

    /// Every failure, local or remote, collapses into `Unauthorized`.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: LoginRequest) -> Result<Session> {
        trace!("Starting login");
        if let Err(e) = ensure_valid(&req) {
            warn!(error = %e, "Rejected login request before contacting identity service");
            return Err(DomainError::Unauthorized(INVALID_CREDENTIALS.to_string()).into());
        }

        let session = self
            .identities
            .create_session(&req.email, &req.password)
            .await
            .map_err(|e| {
                warn!(error = %e, "Session creation failed");
                DomainError::Unauthorized(INVALID_CREDENTIALS.to_string())
            })?;

        info!(user_id = %session.user_id, session_id = %session.id, "Login successful");
        Ok(session)
    }
}
