use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Url};
use serde_json::Value;

use super::{error_from_response, BackendError, BlobStore, GetField, IdToken, InlineData};

/// Cloud Storage for Firebase REST adapter (`/v0/b/{bucket}/o`).
pub struct StorageClient {
    http: reqwest::Client,
    base: String,
    bucket: String,
}

impl StorageClient {
    pub fn new(http: reqwest::Client, bucket: &str) -> Self {
        Self::with_base_url(http, "https://firebasestorage.googleapis.com", bucket)
    }

    pub fn with_base_url(http: reqwest::Client, base: impl Into<String>, bucket: &str) -> Self {
        Self {
            http,
            base: base.into().trim_end_matches('/').to_owned(),
            bucket: bucket.to_owned(),
        }
    }

    fn objects_url(&self) -> Result<Url, BackendError> {
        let mut url = Url::parse(&self.base).map_err(|e| BackendError::Decode(format!("storage base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::Decode("storage base url cannot have a path".to_owned()))?
            .pop_if_empty()
            .extend(["v0", "b", self.bucket.as_str(), "o"]);
        Ok(url)
    }

    /// Object URLs carry the whole path as one segment, so `/` is escaped.
    fn object_url(&self, path: &str) -> Result<Url, BackendError> {
        let mut url = self.objects_url()?;
        url.path_segments_mut()
            .map_err(|_| BackendError::Decode("storage base url cannot have a path".to_owned()))?
            .push(path);
        Ok(url)
    }
}

#[async_trait]
impl BlobStore for StorageClient {
    async fn upload(&self, path: &str, data: &InlineData, auth: &IdToken) -> Result<(), BackendError> {
        let mut url = self.objects_url()?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", path);

        let response = self
            .http
            .post(url)
            .bearer_auth(&auth.0)
            .header(CONTENT_TYPE, &data.content_type)
            .body(data.bytes.clone())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    async fn download_url(&self, path: &str, auth: &IdToken) -> Result<String, BackendError> {
        let url = self.object_url(path)?;
        let response = self.http.get(url.clone()).bearer_auth(&auth.0).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let metadata: Value = response.json().await?;

        // Several comma-separated tokens may exist; any one grants access.
        let tokens = metadata.get_str_field("downloadTokens")?;
        let token = tokens
            .split(',')
            .next()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BackendError::Decode(format!("no download token for {path}")))?;

        let mut url = url;
        url.query_pairs_mut()
            .append_pair("alt", "media")
            .append_pair("token", token);
        Ok(url.to_string())
    }

    async fn delete(&self, path: &str, auth: &IdToken) -> Result<(), BackendError> {
        let response = self
            .http
            .delete(self.object_url(path)?)
            .bearer_auth(&auth.0)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_path_is_a_single_escaped_segment() {
        let client = StorageClient::new(reqwest::Client::new(), "site.appspot.com");
        assert_eq!(
            client.object_url("photos/1700000000000").unwrap().as_str(),
            "https://firebasestorage.googleapis.com/v0/b/site.appspot.com/o/photos%2F1700000000000"
        );
    }
}
