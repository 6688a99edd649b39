use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use anyhow::Result;
use appwrite_users_api::application::auth_service::AuthService;
use appwrite_users_api::application::user_service::UserService;
use appwrite_users_api::data::memory::InMemoryIdentityRepository;
use appwrite_users_api::data::user_repository::InMemoryUserRepository;
use appwrite_users_api::domain::error::DomainError;
use appwrite_users_api::domain::repository::{IdentityRepository, UserRepository};
use appwrite_users_api::domain::session::{Identity, Session};
use appwrite_users_api::domain::user::{LoginRequest, SignupRequest, User};
use appwrite_users_api::presentation::handlers::AppState;
use appwrite_users_api::presentation::routes::configure;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Identity service that counts calls and always fails with a 5xx.
#[derive(Default)]
struct UnavailableIdentity {
    calls: AtomicUsize,
}

#[async_trait]
impl IdentityRepository for UnavailableIdentity {
    async fn create_identity(&self, _: &str, _: &str, _: &str, _: &str) -> Result<Identity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DomainError::remote(Some(503), "Service unavailable").into())
    }

    async fn create_session(&self, _: &str, _: &str) -> Result<Session> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DomainError::remote(Some(503), "Service unavailable").into())
    }
}

/// Document store whose writes always fail.
struct RejectingDocuments;

#[async_trait]
impl UserRepository for RejectingDocuments {
    async fn create_user(&self, _: User) -> Result<User> {
        Err(DomainError::remote(
            Some(400),
            "Invalid document structure: Missing required attribute \"email\"",
        )
        .into())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(Vec::new())
    }

    async fn find_user_by_id(&self, _: &str) -> Result<Option<User>> {
        Ok(None)
    }

    async fn update_user_name(&self, _: &str, _: &str) -> Result<Option<User>> {
        Ok(None)
    }

    async fn delete_user(&self, _: &str) -> Result<bool> {
        Ok(false)
    }
}

macro_rules! setup_auth_test {
    ($identities:expr, $users:expr) => {{
        let identities: Arc<dyn IdentityRepository> = $identities;
        let users: Arc<dyn UserRepository> = $users;
        let state = web::Data::new(AppState {
            auth_service: AuthService::new(identities, users.clone()),
            user_service: UserService::new(users),
        });

        test::init_service(App::new().app_data(state).configure(configure)).await
    }};
    () => {
        setup_auth_test!(
            Arc::new(InMemoryIdentityRepository::new()),
            Arc::new(InMemoryUserRepository::new())
        )
    };
}

fn signup_body(email: &str, password: &str, name: &str) -> SignupRequest {
    SignupRequest {
        email: email.to_string(),
        password: password.to_string(),
        name: name.to_string(),
    }
}

#[actix_web::test]
async fn test_full_signup_login_flow() {
    let app = setup_auth_test!();

    let req = test::TestRequest::post()
        .uri("/signup")
        .set_json(signup_body("flow@example.com", "password123", "Flow"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(resp["message"], "User created successfully");
    assert_eq!(resp["user"]["email"], "flow@example.com");
    assert_eq!(resp["user"]["name"], "Flow");
    let user_id = resp["user"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(LoginRequest {
            email: "flow@example.com".to_string(),
            password: "password123".to_string(),
        })
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(resp["message"], "Login successful");
    assert_eq!(resp["session"]["user_id"], user_id.as_str());
    assert_eq!(resp["session"]["provider"], "email");
}

#[actix_web::test]
async fn test_signup_response_never_contains_password() {
    let app = setup_auth_test!();

    let req = test::TestRequest::post()
        .uri("/signup")
        .set_json(signup_body("secret@example.com", "sensitive_password_123", "S"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body = test::read_body(resp).await;
    let text = std::str::from_utf8(&body).unwrap();
    assert!(!text.contains("sensitive_password_123"));
    assert!(!text.contains("password"));
}

#[actix_web::test]
async fn test_signup_validation_failures() {
    let app = setup_auth_test!();

    let cases = [
        (
            json!({ "email": "no-at-sign.com", "password": "x", "name": "A" }),
            "email: must be a valid email address",
        ),
        (
            json!({ "email": "a@b.com", "password": "", "name": "A" }),
            "password: must not be empty",
        ),
        (
            json!({ "email": "a@b.com", "password": "x" }),
            "name: must not be empty",
        ),
    ];

    for (body, detail) in cases {
        let req = test::TestRequest::post()
            .uri("/signup")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(resp["detail"], detail);
    }
}

#[actix_web::test]
async fn test_malformed_email_makes_no_remote_call() {
    let identities = Arc::new(UnavailableIdentity::default());
    let app = setup_auth_test!(identities.clone(), Arc::new(InMemoryUserRepository::new()));

    let req = test::TestRequest::post()
        .uri("/signup")
        .set_json(signup_body("not-an-email", "x", "A"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(identities.calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn test_signup_duplicate_email_echoes_remote_message() {
    let app = setup_auth_test!();

    for expected in [StatusCode::OK, StatusCode::BAD_REQUEST] {
        let req = test::TestRequest::post()
            .uri("/signup")
            .set_json(signup_body("duplicate@example.com", "pass", "D"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
        if expected == StatusCode::BAD_REQUEST {
            let resp: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(
                resp["detail"],
                "A user with the same id, email, or phone already exists in this project."
            );
        }
    }
}

#[actix_web::test]
async fn test_signup_remote_failure_is_bad_request_with_remote_message() {
    let app = setup_auth_test!(
        Arc::new(UnavailableIdentity::default()),
        Arc::new(InMemoryUserRepository::new())
    );

    let req = test::TestRequest::post()
        .uri("/signup")
        .set_json(signup_body("a@b.com", "x", "A"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(resp["detail"], "Service unavailable");
}

#[actix_web::test]
async fn test_signup_document_failure_surfaces_remote_message() {
    let app = setup_auth_test!(
        Arc::new(InMemoryIdentityRepository::new()),
        Arc::new(RejectingDocuments)
    );

    let req = test::TestRequest::post()
        .uri("/signup")
        .set_json(signup_body("a@b.com", "x", "A"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        resp["detail"],
        "Invalid document structure: Missing required attribute \"email\""
    );
}

#[actix_web::test]
async fn test_login_wrong_password() {
    let app = setup_auth_test!();

    let req = test::TestRequest::post()
        .uri("/signup")
        .set_json(signup_body("wrongpass@example.com", "correct", "W"))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(LoginRequest {
            email: "wrongpass@example.com".to_string(),
            password: "wrong".to_string(),
        })
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(resp["detail"], "Invalid credentials");
}

#[actix_web::test]
async fn test_login_nonexistent_user() {
    let app = setup_auth_test!();

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(LoginRequest {
            email: "nonexistent@example.com".to_string(),
            password: "password".to_string(),
        })
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_login_remote_outage_is_still_unauthorized() {
    let identities = Arc::new(UnavailableIdentity::default());
    let app = setup_auth_test!(identities.clone(), Arc::new(InMemoryUserRepository::new()));

    for (email, password) in [("a@b.com", "x"), ("someone@example.com", "other")] {
        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let resp: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(resp["detail"], "Invalid credentials");
    }
    assert_eq!(identities.calls.load(Ordering::SeqCst), 2);
}

#[actix_web::test]
async fn test_login_with_malformed_input_is_unauthorized_without_remote_call() {
    let identities = Arc::new(UnavailableIdentity::default());
    let app = setup_auth_test!(identities.clone(), Arc::new(InMemoryUserRepository::new()));

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": "not-an-email" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(identities.calls.load(Ordering::SeqCst), 0);
}
