use base64::{engine::general_purpose::STANDARD, Engine};

use super::BackendError;

/// An uploaded file held in memory, convertible to a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineData {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl InlineData {
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { content_type: content_type.into(), bytes }
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, STANDARD.encode(&self.bytes))
    }

    /// Parses `data:<mime>;base64,<payload>`.
    #[cfg(test)]
    pub(crate) fn from_data_url(url: &str) -> Result<Self, BackendError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| BackendError::Decode("not a data URL".to_owned()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| BackendError::Decode("data URL has no payload".to_owned()))?;
        let content_type = meta
            .strip_suffix(";base64")
            .ok_or_else(|| BackendError::Decode("only base64 data URLs are supported".to_owned()))?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| BackendError::Decode(format!("data URL payload: {e}")))?;

        Ok(Self::new(
            if content_type.is_empty() { "application/octet-stream" } else { content_type },
            bytes,
        ))
    }
}
