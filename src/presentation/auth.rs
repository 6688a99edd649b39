use crate::domain::session::Session;
use crate::domain::user::{LoginRequest, SignupRequest, User};
use crate::presentation::handlers::{ApiError, AppState};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{error, info, instrument};

#[derive(Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub session: Session,
}

#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn signup(
    state: web::Data<AppState>,
    req: web::Json<SignupRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Signup request received");

    let user = state
        .auth_service
        .signup(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to sign up user");
            ApiError::from(e)
        })?;

    info!(user_id = %user.id, email = %user.email, "User created successfully");
    Ok(HttpResponse::Ok().json(SignupResponse {
        message: "User created successfully".to_string(),
        user,
    }))
}

#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let session = state
        .auth_service
        .login(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to login");
            ApiError::from(e)
        })?;

    info!(user_id = %session.user_id, "Login successful");
    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Login successful".to_string(),
        session,
    }))
}
