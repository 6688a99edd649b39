use crate::application::auth_service::AuthService;
use crate::application::user_service::UserService;
use crate::domain::error::DomainError;
use crate::domain::user::{UpdateUserRequest, User};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, error::JsonPayloadError, web};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub struct AppState {
    pub auth_service: AuthService,
    pub user_service: UserService,
}

// Uniform error body
#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Hosted backend failure; the message is the service's own text.
    #[error("Remote error: {0}")]
    Remote(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn detail(&self) -> &str {
        match self {
            ApiError::Validation(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Remote(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Remote(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        match self {
            ApiError::Validation(_) => warn!(error = %self, status = %status, "Validation error"),
            ApiError::NotFound(_) => warn!(error = %self, status = %status, "Resource not found"),
            ApiError::Unauthorized(_) => warn!(error = %self, status = %status, "Unauthorized"),
            ApiError::Remote(_) => warn!(error = %self, status = %status, "Remote call failed"),
            ApiError::Internal(_) => error!(error = %self, status = %status, "Internal error"),
        }

        HttpResponse::build(status).json(ErrorResponse {
            detail: self.detail().to_string(),
        })
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<DomainError>() {
            Ok(DomainError::Validation(msg)) => ApiError::Validation(msg),
            Ok(DomainError::NotFound(msg)) => ApiError::NotFound(msg),
            Ok(DomainError::Unauthorized(msg)) => ApiError::Unauthorized(msg),
            Ok(DomainError::Remote { message, .. }) => ApiError::Remote(message),
            Ok(DomainError::Internal(msg)) => ApiError::Internal(msg),
            Err(other) => ApiError::Internal(other.to_string()),
        }
    }
}

/// Renders undecodable JSON bodies in the same `{detail}` shape.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::Validation(err.to_string()).into()
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    info!("Health check requested");
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct UserMessageResponse {
    pub message: String,
    pub user: User,
}

#[instrument(skip(state))]
pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let users = state.user_service.list_users().await.map_err(|e| {
        error!(error = %e, "Failed to list users");
        ApiError::from(e)
    })?;
    info!(count = users.len(), "Users retrieved");
    Ok(HttpResponse::Ok().json(UsersResponse { users }))
}

#[instrument(skip(state), fields(user_id = %*path))]
pub async fn get_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let user = state.user_service.get_user(&user_id).await.map_err(|e| {
        error!(user_id = %user_id, error = %e, "Failed to get user");
        ApiError::from(e)
    })?;
    info!(user_id = %user.id, "User retrieved");
    Ok(HttpResponse::Ok().json(UserResponse { user }))
}

#[instrument(skip(state, req), fields(user_id = %*path))]
pub async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let user = state
        .user_service
        .update_user(&user_id, req.into_inner())
        .await
        .map_err(|e| {
            error!(user_id = %user_id, error = %e, "Failed to update user");
            ApiError::from(e)
        })?;
    info!(user_id = %user.id, name = %user.name, "User updated");
    Ok(HttpResponse::Ok().json(UserMessageResponse {
        message: "User updated successfully".to_string(),
        user,
    }))
}

#[instrument(skip(state), fields(user_id = %*path))]
pub async fn delete_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    state.user_service.delete_user(&user_id).await.map_err(|e| {
        error!(user_id = %user_id, error = %e, "Failed to delete user");
        ApiError::from(e)
    })?;
    info!(user_id = %user_id, "User deleted");
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.error_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_remote_error_is_bad_request_with_verbatim_message() {
        let err = ApiError::from(anyhow::Error::from(DomainError::remote(
            Some(409),
            "A user with the same id, email, or phone already exists in this project.",
        )));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["detail"],
            "A user with the same id, email, or phone already exists in this project."
        );
    }

    #[actix_web::test]
    async fn test_status_mapping() {
        let cases = [
            (DomainError::Validation("v".into()), StatusCode::BAD_REQUEST),
            (DomainError::NotFound("n".into()), StatusCode::NOT_FOUND),
            (DomainError::Unauthorized("u".into()), StatusCode::UNAUTHORIZED),
            (DomainError::remote(None, "r"), StatusCode::BAD_REQUEST),
            (DomainError::Internal("i".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (domain, expected) in cases {
            let (status, body) = body_of(ApiError::from(anyhow::Error::from(domain))).await;
            assert_eq!(status, expected);
            assert!(body["detail"].is_string());
        }
    }

    #[actix_web::test]
    async fn test_unclassified_error_is_internal() {
        let err = ApiError::from(anyhow::anyhow!("boom"));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "boom");
    }
}
