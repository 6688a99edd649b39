//! REST client for the hosted Appwrite project.
//!
//! Every non-2xx answer becomes `DomainError::Remote` carrying the service's
//! own `message`. Lookups by id turn a 404 into `None`/`false`; nothing else
//! inspects status codes.

use crate::domain::error::DomainError;
use crate::domain::repository::{IdentityRepository, UserRepository};
use crate::domain::session::{Identity, Session};
use crate::domain::user::User;
use crate::infrastructure::config::AppwriteConfig;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument, warn};

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const KEY_HEADER: &str = "X-Appwrite-Key";
const PAGE_SIZE: usize = 100;
const MAX_ID_LEN: usize = 36;

/// Appwrite ids: an alphanumeric first character, then up to 35 of
/// `[A-Za-z0-9._-]`. Anything else (notably `.` and `..`, which URL path
/// normalization would swallow) can never name a document.
fn is_document_id(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    id.len() <= MAX_ID_LEN
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

fn query(method: &str, value: serde_json::Value) -> String {
    json!({ "method": method, "values": [value] }).to_string()
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct AccountPayload {
    #[serde(rename = "$id")]
    id: String,
    email: String,
    name: String,
}

#[derive(Deserialize)]
struct SessionPayload {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "userId")]
    user_id: String,
    expire: String,
    provider: String,
    #[serde(default)]
    secret: String,
}

#[derive(Deserialize)]
struct UserDocument {
    #[serde(rename = "$id")]
    id: String,
    email: String,
    name: String,
    #[serde(rename = "$createdAt", default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(rename = "$updatedAt", default)]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct DocumentList {
    total: u64,
    documents: Vec<UserDocument>,
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        User {
            id: doc.id,
            email: doc.email,
            name: doc.name,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

/// Holds the HTTP connection pool and project credentials. Built once at
/// startup and shared by both repository roles.
#[derive(Debug, Clone)]
pub struct AppwriteClient {
    http: reqwest::Client,
    endpoint: Url,
    project_id: String,
    api_key: String,
    database_id: String,
    collection_id: String,
}

impl AppwriteClient {
    pub fn new(config: &AppwriteConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .with_context(|| format!("invalid Appwrite endpoint {:?}", config.endpoint))?;
        if endpoint.cannot_be_a_base() {
            bail!("Appwrite endpoint {:?} cannot carry a path", config.endpoint);
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint,
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            database_id: config.database_id.clone(),
            collection_id: config.collection_id.clone(),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn documents_url(&self) -> Url {
        self.url(&[
            "databases",
            self.database_id.as_str(),
            "collections",
            self.collection_id.as_str(),
            "documents",
        ])
    }

    /// `None` when `id` cannot be an Appwrite id; such a request must never
    /// leave the process since it would address the whole collection.
    fn document_url(&self, id: &str) -> Option<Url> {
        if !is_document_id(id) {
            warn!(user_id = id, "Refusing malformed document id");
            return None;
        }
        let mut url = self.documents_url();
        if let Ok(mut path) = url.path_segments_mut() {
            path.push(id);
        }
        Some(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(PROJECT_HEADER, self.project_id.as_str())
    }

    fn server_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.request(method, url)
            .header(KEY_HEADER, self.api_key.as_str())
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, DomainError> {
        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Appwrite request failed before a response arrived");
            DomainError::remote(None, format!("Failed to reach Appwrite: {}", e))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .map(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unexpected response from Appwrite")
                    .to_string()
            });
        debug!(status = status.as_u16(), message = %message, "Appwrite returned an error");
        Err(DomainError::remote(Some(status.as_u16()), message))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, DomainError> {
        let status = response.status().as_u16();
        response.json::<T>().await.map_err(|e| {
            DomainError::remote(
                Some(status),
                format!("Unexpected response from Appwrite: {}", e),
            )
        })
    }
}

#[async_trait]
impl IdentityRepository for AppwriteClient {
    #[instrument(skip(self, password), fields(user_id = id, email = email))]
    async fn create_identity(
        &self,
        id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Identity> {
        let body = json!({
            "userId": id,
            "email": email,
            "password": password,
            "name": name,
        });
        let response = self
            .send(self.server_request(Method::POST, self.url(&["users"])).json(&body))
            .await?;
        let account: AccountPayload = Self::read_json(response).await?;
        debug!(user_id = %account.id, "Appwrite user created");
        Ok(Identity {
            id: account.id,
            email: account.email,
            name: account.name,
        })
    }

    #[instrument(skip(self, password), fields(email = email))]
    async fn create_session(&self, email: &str, password: &str) -> Result<Session> {
        let body = json!({ "email": email, "password": password });
        let url = self.url(&["account", "sessions", "email"]);
        let response = self.send(self.request(Method::POST, url).json(&body)).await?;
        let session: SessionPayload = Self::read_json(response).await?;
        debug!(session_id = %session.id, user_id = %session.user_id, "Appwrite session created");
        Ok(Session {
            id: session.id,
            user_id: session.user_id,
            expire: session.expire,
            provider: session.provider,
            secret: Some(session.secret).filter(|s| !s.is_empty()),
        })
    }
}

#[async_trait]
impl UserRepository for AppwriteClient {
    #[instrument(skip(self), fields(user_id = %user.id, email = %user.email))]
    async fn create_user(&self, user: User) -> Result<User> {
        let body = json!({
            "documentId": user.id,
            "data": { "email": user.email, "name": user.name },
        });
        let response = self
            .send(
                self.server_request(Method::POST, self.documents_url())
                    .json(&body),
            )
            .await?;
        let doc: UserDocument = Self::read_json(response).await?;
        debug!("Appwrite document created");
        Ok(doc.into())
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = Vec::new();
        loop {
            let mut queries = vec![("queries[]", query("limit", json!(PAGE_SIZE)))];
            if let Some(last) = users.last() {
                queries.push(("queries[]", query("cursorAfter", json!(last.id))));
            }
            let request = self
                .server_request(Method::GET, self.documents_url())
                .query(&queries);
            let response = self.send(request).await?;
            let page: DocumentList = Self::read_json(response).await?;
            let returned = page.documents.len();
            users.extend(page.documents.into_iter().map(User::from));
            debug!(total = page.total, returned, fetched = users.len(), "Appwrite page listed");
            if returned == 0 || users.len() as u64 >= page.total {
                break;
            }
        }
        Ok(users)
    }

    #[instrument(skip(self), fields(user_id = id))]
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let Some(url) = self.document_url(id) else {
            return Ok(None);
        };
        match self.send(self.server_request(Method::GET, url)).await {
            Ok(response) => {
                let doc: UserDocument = Self::read_json(response).await?;
                Ok(Some(doc.into()))
            }
            Err(e) if e.is_remote_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(user_id = id))]
    async fn update_user_name(&self, id: &str, name: &str) -> Result<Option<User>> {
        let Some(url) = self.document_url(id) else {
            return Ok(None);
        };
        let body = json!({ "data": { "name": name } });
        match self
            .send(self.server_request(Method::PATCH, url).json(&body))
            .await
        {
            Ok(response) => {
                let doc: UserDocument = Self::read_json(response).await?;
                Ok(Some(doc.into()))
            }
            Err(e) if e.is_remote_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(user_id = id))]
    async fn delete_user(&self, id: &str) -> Result<bool> {
        let Some(url) = self.document_url(id) else {
            return Ok(false);
        };
        match self.send(self.server_request(Method::DELETE, url)).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_remote_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
