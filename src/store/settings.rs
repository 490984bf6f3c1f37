use serde::{de::DeserializeOwned, Serialize};

use super::{SiteStore, StoreError};
use crate::{
    backend::{fields_of, IdToken, UpdateMode},
    model::{
        AboutContent, AboutUpdate, DesignUpdate, HeroContent, HeroUpdate, SiteDesign, ABOUT_DOC, DESIGN_DOC,
        HERO_DOC, SETTINGS,
    },
};

fn reject_blank(field: &str, value: Option<&String>) -> Result<(), StoreError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(StoreError::Invalid(format!("the {field} must not be empty"))),
        _ => Ok(()),
    }
}

impl SiteStore {
    /// Merges only the supplied fields into a settings singleton and returns
    /// the record as the backend now holds it.
    async fn merge_setting<U: Serialize, T: DeserializeOwned>(
        &self,
        doc_id: &str,
        update: &U,
        auth: &IdToken,
    ) -> Result<T, StoreError> {
        let fields = fields_of(update)?;
        let saved = self
            .inner
            .backend
            .docs
            .update(SETTINGS, doc_id, &fields, UpdateMode::Upsert, Some(auth))
            .await?;
        tracing::info!(doc = doc_id, fields = ?fields.keys().collect::<Vec<_>>(), "settings updated");
        Ok(saved.decode()?)
    }

    pub async fn update_hero(&self, update: HeroUpdate, auth: &IdToken) -> Result<HeroContent, StoreError> {
        reject_blank("title", update.title.as_ref())?;
        let _writer = self.inner.settings_writer.lock().await;

        let hero: HeroContent = self.merge_setting(HERO_DOC, &update, auth).await?;
        self.inner.data.write().await.hero = hero.clone();
        Ok(hero)
    }

    pub async fn update_about(&self, update: AboutUpdate, auth: &IdToken) -> Result<AboutContent, StoreError> {
        reject_blank("title", update.title.as_ref())?;
        let _writer = self.inner.settings_writer.lock().await;

        let about: AboutContent = self.merge_setting(ABOUT_DOC, &update, auth).await?;
        self.inner.data.write().await.about = about.clone();
        Ok(about)
    }

    pub async fn update_design(&self, update: DesignUpdate, auth: &IdToken) -> Result<SiteDesign, StoreError> {
        let _writer = self.inner.settings_writer.lock().await;

        let design: SiteDesign = self.merge_setting(DESIGN_DOC, &update, auth).await?;
        self.inner.data.write().await.design = design.clone();
        Ok(design)
    }
}
