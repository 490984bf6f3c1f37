use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{
    AuthProvider, BackendError, BlobStore, Credentials, Direction, Document, DocumentStore, Fields, IdToken,
    InlineData, OrderBy, UpdateMode,
};
use crate::model::MESSAGES;

/// Operations whose next call can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Query,
    Set,
    Update,
    DeleteDocument,
    Upload,
    DownloadUrl,
    DeleteBlob,
    SignIn,
    Refresh,
}

struct User {
    uid: String,
    password: String,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Fields>>,
    blobs: HashMap<String, InlineData>,
    users: HashMap<String, User>,
    id_tokens: HashMap<String, String>,
    refresh_tokens: HashMap<String, (String, String)>,
    failures: HashMap<FailPoint, BackendError>,
}

/// A process-local backend with the same contract as the Firebase
/// adapters. Anonymous callers may only create contact messages and may not
/// read them back; every other write needs a token it issued.
pub struct MemoryBackend {
    inner: Mutex<Inner>,
    token_lifetime: Mutex<Duration>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            token_lifetime: Mutex::new(Duration::from_secs(3600)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_user(&self, email: &str, password: &str) {
        self.lock().users.insert(
            email.to_ascii_lowercase(),
            User { uid: Uuid::now_v7().simple().to_string(), password: password.to_owned() },
        );
    }

    pub fn set_token_lifetime(&self, lifetime: Duration) {
        *self.token_lifetime.lock().unwrap_or_else(|p| p.into_inner()) = lifetime;
    }

    /// The next call through `point` fails with `err`.
    pub fn fail_next(&self, point: FailPoint, err: BackendError) {
        self.lock().failures.insert(point, err);
    }

    pub fn insert_document(&self, collection: &str, doc: Document) {
        self.lock()
            .collections
            .entry(collection.to_owned())
            .or_default()
            .insert(doc.id, doc.fields);
    }

    pub fn document(&self, collection: &str, id: &str) -> Option<Fields> {
        self.lock().collections.get(collection)?.get(id).cloned()
    }

    pub fn blob(&self, path: &str) -> Option<InlineData> {
        self.lock().blobs.get(path).cloned()
    }

    pub fn blob_count(&self) -> usize {
        self.lock().blobs.len()
    }

    fn trip(inner: &mut Inner, point: FailPoint) -> Result<(), BackendError> {
        match inner.failures.remove(&point) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn check_token(inner: &Inner, auth: &IdToken) -> Result<(), BackendError> {
        if inner.id_tokens.contains_key(&auth.0) {
            Ok(())
        } else {
            Err(BackendError::Unauthorized("unknown or expired token".to_owned()))
        }
    }

    fn check_write(inner: &Inner, collection: &str, auth: Option<&IdToken>, anonymous_ok: bool) -> Result<(), BackendError> {
        match auth {
            Some(token) => Self::check_token(inner, token),
            None if anonymous_ok && collection == MESSAGES => Ok(()),
            None => Err(BackendError::Unauthorized(format!("anonymous write to {collection}"))),
        }
    }

    fn issue(&self, inner: &mut Inner, uid: &str, email: &str) -> Credentials {
        let id_token = format!("mem-id-{}", Uuid::now_v7().simple());
        let refresh_token = format!("mem-refresh-{}", Uuid::now_v7().simple());
        inner.id_tokens.insert(id_token.clone(), uid.to_owned());
        inner
            .refresh_tokens
            .insert(refresh_token.clone(), (uid.to_owned(), email.to_owned()));

        Credentials {
            uid: uid.to_owned(),
            email: email.to_owned(),
            id_token: IdToken(id_token),
            refresh_token,
            expires_in: *self.token_lifetime.lock().unwrap_or_else(|p| p.into_inner()),
        }
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[async_trait]
impl DocumentStore for MemoryBackend {
    async fn query(
        &self,
        collection: &str,
        order: Option<&OrderBy>,
        auth: Option<&IdToken>,
    ) -> Result<Vec<Document>, BackendError> {
        let mut inner = self.lock();
        Self::trip(&mut inner, FailPoint::Query)?;
        match auth {
            Some(token) => Self::check_token(&inner, token)?,
            None if collection == MESSAGES => {
                return Err(BackendError::Unauthorized(format!("anonymous read of {collection}")));
            }
            None => {}
        }

        let Some(docs) = inner.collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut docs: Vec<Document> = docs
            .iter()
            .map(|(id, fields)| Document { id: id.clone(), fields: fields.clone() })
            .collect();

        if let Some(order) = order {
            // documents lacking the ordered field are left out
            docs.retain(|d| d.fields.contains_key(&order.field));
            docs.sort_by(|a, b| {
                let ord = compare(&a.fields[&order.field], &b.fields[&order.field]);
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        Ok(docs)
    }

    async fn set(&self, collection: &str, doc: &Document, auth: Option<&IdToken>) -> Result<Document, BackendError> {
        let mut inner = self.lock();
        Self::trip(&mut inner, FailPoint::Set)?;
        Self::check_write(&inner, collection, auth, true)?;

        inner
            .collections
            .entry(collection.to_owned())
            .or_default()
            .insert(doc.id.clone(), doc.fields.clone());
        Ok(doc.clone())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: &Fields,
        mode: UpdateMode,
        auth: Option<&IdToken>,
    ) -> Result<Document, BackendError> {
        let mut inner = self.lock();
        Self::trip(&mut inner, FailPoint::Update)?;
        Self::check_write(&inner, collection, auth, false)?;

        let docs = inner.collections.entry(collection.to_owned()).or_default();
        if mode == UpdateMode::Existing && !docs.contains_key(id) {
            return Err(BackendError::NotFound(format!("{collection}/{id}")));
        }
        let stored = docs.entry(id.to_owned()).or_default();
        for (key, value) in fields {
            stored.insert(key.clone(), value.clone());
        }
        Ok(Document { id: id.to_owned(), fields: stored.clone() })
    }

    async fn delete(&self, collection: &str, id: &str, auth: Option<&IdToken>) -> Result<(), BackendError> {
        let mut inner = self.lock();
        Self::trip(&mut inner, FailPoint::DeleteDocument)?;
        Self::check_write(&inner, collection, auth, false)?;

        if let Some(docs) = inner.collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBackend {
    async fn upload(&self, path: &str, data: &InlineData, auth: &IdToken) -> Result<(), BackendError> {
        let mut inner = self.lock();
        Self::trip(&mut inner, FailPoint::Upload)?;
        Self::check_token(&inner, auth)?;

        inner.blobs.insert(path.to_owned(), data.clone());
        Ok(())
    }

    /// Blobs are served inline, so the URL is the data itself.
    async fn download_url(&self, path: &str, auth: &IdToken) -> Result<String, BackendError> {
        let mut inner = self.lock();
        Self::trip(&mut inner, FailPoint::DownloadUrl)?;
        Self::check_token(&inner, auth)?;

        inner
            .blobs
            .get(path)
            .map(InlineData::to_data_url)
            .ok_or_else(|| BackendError::NotFound(path.to_owned()))
    }

    async fn delete(&self, path: &str, auth: &IdToken) -> Result<(), BackendError> {
        let mut inner = self.lock();
        Self::trip(&mut inner, FailPoint::DeleteBlob)?;
        Self::check_token(&inner, auth)?;

        inner
            .blobs
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(path.to_owned()))
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credentials, BackendError> {
        let mut inner = self.lock();
        Self::trip(&mut inner, FailPoint::SignIn)?;

        let email = email.trim().to_ascii_lowercase();
        let uid = match inner.users.get(&email) {
            Some(user) if user.password == password => user.uid.clone(),
            _ => return Err(BackendError::InvalidCredentials),
        };
        Ok(self.issue(&mut inner, &uid, &email))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, BackendError> {
        let mut inner = self.lock();
        Self::trip(&mut inner, FailPoint::Refresh)?;

        let (uid, email) = inner
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| BackendError::Unauthorized("unknown refresh token".to_owned()))?;
        Ok(self.issue(&mut inner, &uid, &email))
    }
}
