use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use appwrite_users_api::application::auth_service::AuthService;
use appwrite_users_api::application::user_service::UserService;
use appwrite_users_api::data::appwrite::AppwriteClient;
use appwrite_users_api::data::memory::InMemoryIdentityRepository;
use appwrite_users_api::data::user_repository::InMemoryUserRepository;
use appwrite_users_api::domain::repository::{IdentityRepository, UserRepository};
use appwrite_users_api::infrastructure::config::{AppConfig, StorageBackend};
use appwrite_users_api::infrastructure::logging::init_logging;
use appwrite_users_api::presentation::handlers::AppState;
use appwrite_users_api::presentation::middleware::{RequestIdMiddleware, TimingMiddleware};
use appwrite_users_api::presentation::routes::{ROUTES, configure};
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};

type Backends = (Arc<dyn IdentityRepository>, Arc<dyn UserRepository>);

fn build_backends(config: &AppConfig) -> anyhow::Result<Backends> {
    match (config.backend, &config.appwrite) {
        (StorageBackend::Appwrite, Some(appwrite)) => {
            info!(
                endpoint = %appwrite.endpoint,
                project_id = %appwrite.project_id,
                database_id = %appwrite.database_id,
                collection_id = %appwrite.collection_id,
                "Using Appwrite backend"
            );
            let client = Arc::new(AppwriteClient::new(appwrite)?);
            let identities: Arc<dyn IdentityRepository> = client.clone();
            let users: Arc<dyn UserRepository> = client;
            Ok((identities, users))
        }
        (StorageBackend::Appwrite, None) => {
            anyhow::bail!("Appwrite backend selected without Appwrite settings")
        }
        (StorageBackend::Memory, _) => {
            warn!("Using in-memory backend; data is lost on restart");
            let identities: Arc<dyn IdentityRepository> =
                Arc::new(InMemoryIdentityRepository::new());
            let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
            Ok((identities, users))
        }
    }
}

fn cors(origin: Option<&str>) -> Cors {
    let cors = match origin {
        Some(origin) => Cors::default().allowed_origin(origin),
        None => Cors::default().allow_any_origin(),
    };
    cors.allow_any_method().allow_any_header().max_age(3600)
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("configuration error: {e}");
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    init_logging("info");
    info!(backend = ?config.backend, "Configuration loaded");

    let (identities, users) = build_backends(&config).map_err(|e| {
        error!(error = %e, "Failed to initialize backend");
        io::Error::other(e.to_string())
    })?;

    let state = web::Data::new(AppState {
        auth_service: AuthService::new(identities, users.clone()),
        user_service: UserService::new(users),
    });
    info!("Application state initialized");

    let cors_origin = config.cors_allowed_origin.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(cors_origin.as_deref()))
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .configure(configure)
    });

    let bind_addr = config.bind_addr();
    let server = server.bind(bind_addr.as_str())?;
    info!(address = %bind_addr, routes = %ROUTES, "Starting HTTP server");
    server.run().await
}
