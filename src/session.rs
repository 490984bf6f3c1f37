use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{backend::BackendError, store::StoreError, AppResult};

pub const ADMIN: &str = "admin";
pub const CSRF_TOKEN: &str = "csrf_token";
pub const FLASH: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashKind {
    Success,
    /// Failed, but trying again may work.
    Retry,
    Error,
}

impl FlashKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            FlashKind::Success => "notice success",
            FlashKind::Retry => "notice retry",
            FlashKind::Error => "notice error",
        }
    }
}

/// One-shot notice shown on the next page render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub text: String,
}

impl Flash {
    pub fn success(text: impl Into<String>) -> Self {
        Self { kind: FlashKind::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: FlashKind::Error, text: text.into() }
    }

    pub fn retry(text: impl Into<String>) -> Self {
        Self { kind: FlashKind::Retry, text: text.into() }
    }

    /// Describes a failed command to the admin.
    pub fn from_store_error(action: &str, err: &StoreError) -> Self {
        match err {
            StoreError::PartialDelete { .. } => Self::retry(format!(
                "{action}: the photo is hidden but could not be fully removed. Use \"Retry pending deletions\"."
            )),
            err if err.is_retryable() => {
                Self::retry(format!("{action}: the service is unavailable right now. Please try again."))
            }
            StoreError::Backend(BackendError::Unauthorized(_)) => {
                Self::error(format!("{action}: your session has expired. Please sign in again."))
            }
            StoreError::Invalid(reason) => Self::error(format!("{action}: {reason}.")),
            StoreError::Missing { .. } => Self::error(format!("{action}: that item no longer exists.")),
            StoreError::Backend(err) => Self::error(format!("{action}: {err}.")),
        }
    }
}

pub async fn set_flash(session: &Session, flash: Flash) -> AppResult<()> {
    session.insert(FLASH, flash).await?;
    Ok(())
}

pub async fn take_flash(session: &Session) -> AppResult<Option<Flash>> {
    Ok(session.remove::<Flash>(FLASH).await?)
}

/// The per-session token admin forms must echo back.
pub async fn csrf_token(session: &Session) -> AppResult<String> {
    if let Some(token) = session.get::<String>(CSRF_TOKEN).await? {
        return Ok(token);
    }
    let bytes: [u8; 32] = rand::rng().random();
    let token = URL_SAFE_NO_PAD.encode(bytes);
    session.insert(CSRF_TOKEN, &token).await?;
    Ok(token)
}

pub async fn verify_csrf(session: &Session, submitted: &str) -> AppResult<bool> {
    Ok(session
        .get::<String>(CSRF_TOKEN)
        .await?
        .is_some_and(|expected| !submitted.is_empty() && expected == submitted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_notices() {
        let retry = Flash::from_store_error("Upload", &StoreError::Backend(BackendError::Transient("x".into())));
        assert_eq!(retry.kind, FlashKind::Retry);

        let invalid = Flash::from_store_error("Upload", &StoreError::Invalid("a photo needs a title".into()));
        assert_eq!(invalid, Flash::error("Upload: a photo needs a title."));

        let expired = Flash::from_store_error("Save", &StoreError::Backend(BackendError::Unauthorized("x".into())));
        assert!(expired.text.contains("sign in again"));

        let partial = Flash::from_store_error(
            "Delete",
            &StoreError::PartialDelete { id: "1".into(), source: BackendError::Transient("x".into()) },
        );
        assert_eq!(partial.kind, FlashKind::Retry);
    }
}
