use chrono::Utc;
use serde_json::json;

use super::{SiteStore, StoreError};
use crate::{
    backend::{fields_of, BackendError, Document, IdToken, InlineData, UpdateMode},
    model::{NewPhoto, Photo, PhotoEdit, PHOTOS},
};

/// Outcome of re-attempting interrupted deletions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub failed: usize,
}

fn clean_caption(caption: Option<String>) -> Option<String> {
    caption.map(|c| c.trim().to_owned()).filter(|c| !c.is_empty())
}

fn require_title(title: &str) -> Result<String, StoreError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StoreError::Invalid("a photo needs a title".to_owned()));
    }
    Ok(title.to_owned())
}

impl SiteStore {
    /// Uploads the image, then records the photo. A record that cannot be
    /// written takes its blob with it.
    pub async fn add_photo(&self, new: NewPhoto, image: InlineData, auth: &IdToken) -> Result<Photo, StoreError> {
        let title = require_title(&new.title)?;
        if !image.is_image() || image.bytes.is_empty() {
            return Err(StoreError::Invalid("the upload must be an image file".to_owned()));
        }

        let _writer = self.inner.photo_writer.lock().await;
        let backend = &self.inner.backend;

        let mut millis = Utc::now().timestamp_millis();
        {
            let data = self.inner.data.read().await;
            while data.photos.iter().any(|p| p.id == millis.to_string()) {
                millis += 1;
            }
        }
        let id = millis.to_string();
        let storage_path = Photo::storage_path_for(&id);

        backend.blobs.upload(&storage_path, &image, auth).await?;

        let recorded: Result<Photo, BackendError> = async {
            let src = backend.blobs.download_url(&storage_path, auth).await?;
            let photo = Photo {
                id: id.clone(),
                src,
                title,
                category: new.category,
                storage_path: storage_path.clone(),
                caption: clean_caption(new.caption),
                is_archived: false,
                pending_delete: false,
            };
            let saved = backend.docs.set(PHOTOS, &Document::from_record(&id, &photo)?, Some(auth)).await?;
            saved.decode::<Photo>()
        }
        .await;

        let photo = match recorded {
            Ok(photo) => photo,
            Err(err) => {
                if let Err(cleanup) = backend.blobs.delete(&storage_path, auth).await {
                    tracing::warn!(path = %storage_path, %cleanup, "orphaned blob after failed photo upload");
                }
                return Err(err.into());
            }
        };

        tracing::info!(id = %photo.id, title = %photo.title, "photo added");
        self.inner.data.write().await.photos.insert(0, photo.clone());
        Ok(photo)
    }

    pub async fn edit_photo(&self, id: &str, edit: PhotoEdit, auth: &IdToken) -> Result<Photo, StoreError> {
        let title = require_title(&edit.title)?;
        let _writer = self.inner.photo_writer.lock().await;
        self.require_photo(id).await?;

        let fields = fields_of(&json!({
            "title": title,
            "category": edit.category,
            "caption": clean_caption(edit.caption),
        }))?;
        let saved = self
            .inner
            .backend
            .docs
            .update(PHOTOS, id, &fields, UpdateMode::Existing, Some(auth))
            .await?;
        self.replace_photo(saved.decode()?).await
    }

    /// Flips the archived flag; applying it twice restores the photo.
    pub async fn toggle_archive(&self, id: &str, auth: &IdToken) -> Result<Photo, StoreError> {
        let _writer = self.inner.photo_writer.lock().await;
        let current = self.require_photo(id).await?;

        let fields = fields_of(&json!({ "isArchived": !current.is_archived }))?;
        let saved = self
            .inner
            .backend
            .docs
            .update(PHOTOS, id, &fields, UpdateMode::Existing, Some(auth))
            .await?;
        let photo = self.replace_photo(saved.decode()?).await?;
        tracing::info!(id, archived = photo.is_archived, "photo archive toggled");
        Ok(photo)
    }

    /// Deletes a photo's blob and record.
    ///
    /// The record is tombstoned first so the photo disappears from every
    /// view even if a later step fails; [`SiteStore::sweep_tombstones`]
    /// finishes such deletions.
    pub async fn delete_photo(&self, id: &str, auth: &IdToken) -> Result<(), StoreError> {
        let _writer = self.inner.photo_writer.lock().await;
        let photo = self.require_photo(id).await?;

        if !photo.pending_delete {
            let fields = fields_of(&json!({ "pendingDelete": true }))?;
            match self
                .inner
                .backend
                .docs
                .update(PHOTOS, id, &fields, UpdateMode::Existing, Some(auth))
                .await
            {
                Ok(_) => self.set_pending_delete(id).await,
                // the record is already gone; only the blob may remain
                Err(BackendError::NotFound(_)) => {}
                Err(err) => return Err(err.into()),
            }
        }

        self.finish_delete(&photo, auth).await
    }

    /// Re-attempts every interrupted deletion.
    pub async fn sweep_tombstones(&self, auth: &IdToken) -> SweepReport {
        let _writer = self.inner.photo_writer.lock().await;
        let pending: Vec<Photo> = self
            .inner
            .data
            .read()
            .await
            .photos
            .iter()
            .filter(|p| p.pending_delete)
            .cloned()
            .collect();

        let mut report = SweepReport::default();
        for photo in pending {
            match self.finish_delete(&photo, auth).await {
                Ok(()) => report.removed += 1,
                Err(err) => {
                    tracing::warn!(id = %photo.id, %err, "pending photo deletion still incomplete");
                    report.failed += 1;
                }
            }
        }
        if report != SweepReport::default() {
            tracing::info!(removed = report.removed, failed = report.failed, "tombstone sweep finished");
        }
        report
    }

    async fn finish_delete(&self, photo: &Photo, auth: &IdToken) -> Result<(), StoreError> {
        let backend = &self.inner.backend;
        let partial = |source| StoreError::PartialDelete { id: photo.id.clone(), source };

        match backend.blobs.delete(&photo.storage_path, auth).await {
            Ok(()) | Err(BackendError::NotFound(_)) => {}
            Err(err) => return Err(partial(err)),
        }
        backend.docs.delete(PHOTOS, &photo.id, Some(auth)).await.map_err(partial)?;

        self.inner.data.write().await.photos.retain(|p| p.id != photo.id);
        tracing::info!(id = %photo.id, "photo deleted");
        Ok(())
    }

    async fn require_photo(&self, id: &str) -> Result<Photo, StoreError> {
        self.photo(id).await.ok_or_else(|| StoreError::Missing { kind: "photo", id: id.to_owned() })
    }

    async fn replace_photo(&self, photo: Photo) -> Result<Photo, StoreError> {
        let mut data = self.inner.data.write().await;
        let slot = data
            .photos
            .iter_mut()
            .find(|p| p.id == photo.id)
            .ok_or_else(|| StoreError::Missing { kind: "photo", id: photo.id.clone() })?;
        *slot = photo.clone();
        Ok(photo)
    }

    async fn set_pending_delete(&self, id: &str) {
        if let Some(photo) = self.inner.data.write().await.photos.iter_mut().find(|p| p.id == id) {
            photo.pending_delete = true;
        }
    }
}
