use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_APPWRITE_ENDPOINT: &str = "https://cloud.appwrite.io/v1";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Appwrite,
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppwriteConfig {
    pub endpoint: String,
    pub project_id: String,
    pub api_key: String,
    pub database_id: String,
    pub collection_id: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: StorageBackend,
    /// Present whenever `backend` is `Appwrite`.
    pub appwrite: Option<AppwriteConfig>,
    /// `None` allows any origin.
    pub cors_allowed_origin: Option<String>,
}

impl AppConfig {
    /// Reads the process environment, loading `.env` first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get("PORT") {
            Some(raw) => parse_number("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let backend = match get("STORAGE_BACKEND").as_deref() {
            None | Some("appwrite") => StorageBackend::Appwrite,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE_BACKEND",
                    value: other.to_string(),
                    reason: "expected \"appwrite\" or \"memory\"".to_string(),
                });
            }
        };

        let appwrite = match backend {
            StorageBackend::Memory => None,
            StorageBackend::Appwrite => {
                let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));
                let timeout_secs = match get("APPWRITE_TIMEOUT_SECS") {
                    Some(raw) => parse_number("APPWRITE_TIMEOUT_SECS", &raw)?,
                    None => DEFAULT_TIMEOUT_SECS,
                };
                Some(AppwriteConfig {
                    endpoint: get("APPWRITE_ENDPOINT")
                        .unwrap_or_else(|| DEFAULT_APPWRITE_ENDPOINT.to_string()),
                    project_id: required("PROJECT_ID")?,
                    api_key: required("API_KEY_SECRET")?,
                    database_id: required("DATABASE_ID")?,
                    collection_id: required("COLLECTION_ID")?,
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
        };

        Ok(Self {
            host,
            port,
            backend,
            appwrite,
            cors_allowed_origin: get("CORS_ALLOWED_ORIGIN"),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
