use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Failure reported by (or while reaching) the hosted backend.
    /// `status` is `None` when no HTTP response was received.
    #[error("{message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        DomainError::Remote {
            status,
            message: message.into(),
        }
    }

    pub fn is_remote_not_found(&self) -> bool {
        matches!(self, DomainError::Remote { status: Some(404), .. })
    }
}
