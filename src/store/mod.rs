//! The site's shared state: photos, messages and the three settings
//! singletons, loaded from the backend and kept in step with it. Messages
//! are private, so they are read with the admin's credential at sign-in.
//!
//! Every command issues its remote write first and applies the document the
//! backend hands back; nothing is changed locally until the write is
//! confirmed. Writes to one entity group are serialized.

mod messages;
mod photos;
mod settings;

use std::{cmp::Ordering, sync::Arc};

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::{
    backend::{Backend, BackendError, Document, IdToken, OrderBy},
    model::{
        AboutContent, HeroContent, Message, Photo, SiteDesign, ABOUT_DOC, DESIGN_DOC, HERO_DOC, MESSAGES, PHOTOS,
        SETTINGS,
    },
};

pub use photos::SweepReport;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("{0}")]
    Invalid(String),
    #[error("no {kind} with id {id}")]
    Missing { kind: &'static str, id: String },
    #[error("photo {id} is hidden but not yet fully deleted: {source}")]
    PartialDelete {
        id: String,
        #[source]
        source: BackendError,
    },
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Backend(err) => err.is_retryable(),
            // the sweep finishes what was started
            StoreError::PartialDelete { .. } => true,
            StoreError::Invalid(_) | StoreError::Missing { .. } => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SiteData {
    pub photos: Vec<Photo>,
    pub messages: Vec<Message>,
    pub hero: HeroContent,
    pub about: AboutContent,
    pub design: SiteDesign,
}

struct Inner {
    backend: Backend,
    data: RwLock<SiteData>,
    photo_writer: Mutex<()>,
    message_writer: Mutex<()>,
    settings_writer: Mutex<()>,
}

#[derive(Clone)]
pub struct SiteStore {
    inner: Arc<Inner>,
}

impl SiteStore {
    pub fn empty(backend: Backend) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                data: RwLock::new(SiteData::default()),
                photo_writer: Mutex::new(()),
                message_writer: Mutex::new(()),
                settings_writer: Mutex::new(()),
            }),
        }
    }

    /// Loads the public parts from the backend. A part that fails to load
    /// is logged and left empty (or at its defaults).
    pub async fn load(backend: Backend) -> Self {
        let store = Self::empty(backend);
        let data = SiteData {
            photos: store.load_photos().await,
            ..store.load_settings().await
        };
        tracing::info!(photos = data.photos.len(), "site data loaded");
        *store.inner.data.write().await = data;
        store
    }

    async fn load_photos(&self) -> Vec<Photo> {
        match self.inner.backend.docs.query(PHOTOS, Some(&OrderBy::desc("id")), None).await {
            Ok(docs) => {
                let mut photos: Vec<Photo> = decode_all(&docs, "photo");
                photos.sort_by(|a, b| newest_id_first(&a.id, &b.id));
                photos
            }
            Err(err) => {
                tracing::error!(%err, "loading photos failed");
                Vec::new()
            }
        }
    }

    /// Replaces the mailbox with what the backend holds, newest first.
    pub async fn reload_messages(&self, auth: &IdToken) -> Result<usize, StoreError> {
        let _writer = self.inner.message_writer.lock().await;
        let docs = self
            .inner
            .backend
            .docs
            .query(MESSAGES, Some(&OrderBy::desc("timestamp")), Some(auth))
            .await?;
        let mut messages: Vec<Message> = decode_all(&docs, "message");
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let count = messages.len();
        self.inner.data.write().await.messages = messages;
        tracing::info!(messages = count, "mailbox loaded");
        Ok(count)
    }

    async fn load_settings(&self) -> SiteData {
        let mut data = SiteData::default();
        let docs = match self.inner.backend.docs.query(SETTINGS, None, None).await {
            Ok(docs) => docs,
            Err(err) => {
                tracing::error!(%err, "loading settings failed");
                return data;
            }
        };

        for doc in &docs {
            let decoded = match doc.id.as_str() {
                HERO_DOC => doc.decode().map(|hero| data.hero = hero),
                ABOUT_DOC => doc.decode().map(|about| data.about = about),
                DESIGN_DOC => doc.decode().map(|design| data.design = design),
                other => {
                    tracing::debug!(id = other, "ignoring unknown settings document");
                    Ok(())
                }
            };
            if let Err(err) = decoded {
                tracing::warn!(id = %doc.id, %err, "settings document unreadable, using defaults");
            }
        }
        data
    }

    #[cfg(test)]
    pub async fn snapshot(&self) -> SiteData {
        self.inner.data.read().await.clone()
    }

    pub async fn photos(&self) -> Vec<Photo> {
        self.inner.data.read().await.photos.clone()
    }

    pub async fn photo(&self, id: &str) -> Option<Photo> {
        self.inner.data.read().await.photos.iter().find(|p| p.id == id).cloned()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.inner.data.read().await.messages.clone()
    }

    pub async fn hero(&self) -> HeroContent {
        self.inner.data.read().await.hero.clone()
    }

    pub async fn about(&self) -> AboutContent {
        self.inner.data.read().await.about.clone()
    }

    pub async fn design(&self) -> SiteDesign {
        self.inner.data.read().await.design.clone()
    }
}

fn decode_all<T: serde::de::DeserializeOwned>(docs: &[Document], kind: &str) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match doc.decode() {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(kind, id = %doc.id, %err, "skipping unreadable document");
                None
            }
        })
        .collect()
}

/// Photo ids are creation millis; longer means later.
fn newest_id_first(a: &str, b: &str) -> Ordering {
    b.len().cmp(&a.len()).then_with(|| b.cmp(a))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::backend::{AuthProvider, Backend, IdToken, MemoryBackend};

    use super::SiteStore;

    pub(crate) async fn signed_in_store() -> (SiteStore, Arc<MemoryBackend>, IdToken) {
        let memory = Arc::new(MemoryBackend::new());
        memory.add_user("admin@example.com", "pw");
        let creds = memory.sign_in("admin@example.com", "pw").await.unwrap();
        let store = SiteStore::load(Backend::memory(memory.clone())).await;
        (store, memory, creds.id_token)
    }
}
