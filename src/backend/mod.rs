//! Adapters for the managed backend: document collections, blob storage and
//! password sign-in. The application owns no persistence of its own; every
//! read and write goes through the traits defined here.

mod firestore;
mod identity;
mod inline;
mod memory;
mod storage;

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{BackendKind, Config};

pub use firestore::FirestoreClient;
pub use identity::IdentityClient;
pub use inline::InlineData;
pub use memory::{FailPoint, MemoryBackend};
pub use storage::StorageClient;

pub type Fields = Map<String, Value>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Transient(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rejected by backend ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected backend payload: {0}")]
    Decode(String),
}

impl BackendError {
    /// Whether re-attempting the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BackendError::Transient(_))
    }

    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => BackendError::Unauthorized(message),
            404 => BackendError::NotFound(message),
            408 | 429 | 500..=599 => BackendError::Transient(format!("{status}: {message}")),
            _ => BackendError::Rejected { status, message },
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            BackendError::Transient(err.to_string())
        } else if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            BackendError::from_status(status.as_u16(), err.to_string())
        } else {
            BackendError::Transient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> Result<String, BackendError>;
    fn get_obj_field(&self, field: &str) -> Result<&Value, BackendError>;
}

impl GetField for Value {
    fn get_str_field(&self, field: &str) -> Result<String, BackendError> {
        Ok(
            self.get(field)
            .ok_or_else(|| BackendError::Decode(format!("expected {field} in {self}")))?
            .as_str()
            .ok_or_else(|| BackendError::Decode(format!("expected {field} in {self} to be string")))?
            .to_owned()
        )
    }

    fn get_obj_field(&self, field: &str) -> Result<&Value, BackendError> {
        self.get(field)
        .ok_or_else(|| BackendError::Decode(format!("expected {field} in {self}")))
    }
}

/// Bearer credential for writes made on behalf of the signed-in admin.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdToken(pub String);

impl fmt::Debug for IdToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("IdToken(..)")
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub uid: String,
    pub email: String,
    pub id_token: IdToken,
    pub refresh_token: String,
    pub expires_in: Duration,
}

/// One stored document. `fields` is plain JSON; adapters translate to and
/// from their wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn from_record<T: Serialize>(id: impl Into<String>, record: &T) -> Result<Self, BackendError> {
        match serde_json::to_value(record)? {
            Value::Object(fields) => Ok(Self { id: id.into(), fields }),
            other => Err(BackendError::Decode(format!("record must serialize to an object, got {other}"))),
        }
    }

    /// Decodes the document, exposing its id as the `id` field.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BackendError> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_owned(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

/// Serializes a partial record into the top-level fields to merge.
pub fn fields_of<T: Serialize>(partial: &T) -> Result<Fields, BackendError> {
    match serde_json::to_value(partial)? {
        Value::Object(fields) => Ok(fields),
        other => Err(BackendError::Decode(format!("update must serialize to an object, got {other}"))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn desc(field: &str) -> Self {
        Self { field: field.to_owned(), direction: Direction::Descending }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Create the document when it does not exist yet.
    Upsert,
    /// Fail with [`BackendError::NotFound`] when the document is missing.
    Existing,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(
        &self,
        collection: &str,
        order: Option<&OrderBy>,
        auth: Option<&IdToken>,
    ) -> Result<Vec<Document>, BackendError>;

    async fn set(&self, collection: &str, doc: &Document, auth: Option<&IdToken>) -> Result<Document, BackendError>;

    /// Merges `fields` into the document and returns the resulting document.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: &Fields,
        mode: UpdateMode,
        auth: Option<&IdToken>,
    ) -> Result<Document, BackendError>;

    async fn delete(&self, collection: &str, id: &str, auth: Option<&IdToken>) -> Result<(), BackendError>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, data: &InlineData, auth: &IdToken) -> Result<(), BackendError>;

    async fn download_url(&self, path: &str, auth: &IdToken) -> Result<String, BackendError>;

    /// Reports [`BackendError::NotFound`] when nothing is stored at `path`.
    async fn delete(&self, path: &str, auth: &IdToken) -> Result<(), BackendError>;
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credentials, BackendError>;

    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, BackendError>;
}

#[derive(Clone)]
pub struct Backend {
    pub docs: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub auth: Arc<dyn AuthProvider>,
}

impl Backend {
    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        match &config.backend {
            BackendKind::Firebase(firebase) => {
                let http = reqwest::Client::builder()
                    .timeout(config.request_timeout)
                    .build()?;
                Ok(Self {
                    docs: Arc::new(FirestoreClient::new(http.clone(), &firebase.project_id)),
                    blobs: Arc::new(StorageClient::new(http.clone(), &firebase.storage_bucket)),
                    auth: Arc::new(IdentityClient::new(http, &firebase.api_key)),
                })
            }
            BackendKind::Memory { admin_email, admin_password } => {
                let memory = Arc::new(MemoryBackend::new());
                memory.add_user(admin_email, admin_password);
                Ok(Self::memory(memory))
            }
        }
    }

    pub fn memory(memory: Arc<MemoryBackend>) -> Self {
        Self {
            docs: memory.clone(),
            blobs: memory.clone(),
            auth: memory,
        }
    }
}

/// Reads the `{"error": {"message": ..}}` envelope Google APIs return.
pub(crate) async fn error_from_response(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get_obj_field("error").ok()?.get_str_field("message").ok())
        .unwrap_or(body);
    BackendError::from_status(status, message)
}
