use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::{SiteStore, StoreError};
use crate::{
    backend::{fields_of, Document, IdToken, UpdateMode},
    model::{Message, NewMessage, MESSAGES},
};

impl SiteStore {
    /// Records a contact-form submission. Anyone may call this.
    pub async fn add_message(&self, new: NewMessage) -> Result<Message, StoreError> {
        if let Some(field) = new.missing_field() {
            return Err(StoreError::Invalid(format!("the {field} field is required")));
        }

        let message = Message {
            id: Uuid::now_v7().simple().to_string(),
            name: new.name.trim().to_owned(),
            email: new.email.trim().to_owned(),
            body: new.message.trim().to_owned(),
            timestamp: Utc::now(),
            replied: false,
        };

        let _writer = self.inner.message_writer.lock().await;
        let saved = self
            .inner
            .backend
            .docs
            .set(MESSAGES, &Document::from_record(&message.id, &message)?, None)
            .await?;
        let message: Message = saved.decode()?;

        tracing::info!(id = %message.id, "contact message received");
        self.inner.data.write().await.messages.insert(0, message.clone());
        Ok(message)
    }

    pub async fn toggle_replied(&self, id: &str, auth: &IdToken) -> Result<Message, StoreError> {
        let _writer = self.inner.message_writer.lock().await;
        let replied = self
            .inner
            .data
            .read()
            .await
            .messages
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.replied)
            .ok_or_else(|| StoreError::Missing { kind: "message", id: id.to_owned() })?;

        let fields = fields_of(&json!({ "replied": !replied }))?;
        let saved = self
            .inner
            .backend
            .docs
            .update(MESSAGES, id, &fields, UpdateMode::Existing, Some(auth))
            .await?;
        let message: Message = saved.decode()?;

        let mut data = self.inner.data.write().await;
        if let Some(slot) = data.messages.iter_mut().find(|m| m.id == id) {
            *slot = message.clone();
        }
        Ok(message)
    }
}
