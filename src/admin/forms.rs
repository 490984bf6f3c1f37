use std::collections::HashMap;

use axum::extract::{multipart::MultipartError, Multipart};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{backend::InlineData, session::verify_csrf, AppResult};

/// A buffered `multipart/form-data` submission. Empty file inputs are
/// dropped.
#[derive(Debug, Default)]
pub(crate) struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, InlineData>,
}

impl MultipartForm {
    pub(crate) async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            if field.file_name().is_some() {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    form.files.insert(name, InlineData::new(content_type, bytes.to_vec()));
                }
            } else {
                form.fields.insert(name, field.text().await?);
            }
        }
        Ok(form)
    }

    pub(crate) fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    /// The trimmed value, or `None` when blank.
    pub(crate) fn optional(&self, name: &str) -> Option<String> {
        Some(self.text(name).trim())
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    }

    pub(crate) fn take_file(&mut self, name: &str) -> Option<InlineData> {
        self.files.remove(name)
    }

    pub(crate) async fn verify_csrf(&self, session: &Session) -> AppResult<bool> {
        verify_csrf(session, self.text("csrf_token")).await
    }
}

/// Body of the admin forms that carry nothing but the token.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenForm {
    #[serde(default)]
    pub(crate) csrf_token: String,
}

/// An optional replacement image, which must be an image file.
pub(crate) fn image_data_url(file: Option<InlineData>) -> Result<Option<String>, &'static str> {
    match file {
        None => Ok(None),
        Some(file) if file.is_image() => Ok(Some(file.to_data_url())),
        Some(_) => Err("the file must be an image"),
    }
}
