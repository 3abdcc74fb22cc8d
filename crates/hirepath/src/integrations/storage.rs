use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::config::BackendConfig;

/// Upload failure surfaced to the caller. There is no retry and no cleanup of
/// partially uploaded objects.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("document upload failed: {0}")]
    Upload(String),
}

/// Outbound contract with the object storage bucket holding applicant
/// documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn store(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<(), StorageError>;

    fn public_url(&self, key: &str) -> String;
}

/// Build the storage key for an uploaded document.
///
/// Uniqueness relies on the millisecond timestamp plus the optional record
/// index; collisions inside one millisecond are accepted for this single-user,
/// sequential flow.
pub fn object_key(
    folder: &str,
    timestamp_millis: i64,
    index: Option<usize>,
    extension: &str,
) -> String {
    match index {
        Some(index) => format!("{folder}/{timestamp_millis}_{index}.{extension}"),
        None => format!("{folder}/{timestamp_millis}.{extension}"),
    }
}

/// Document store backed by the hosted backend's storage REST API.
pub struct RestDocumentStore {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    anon_key: String,
}

impl RestDocumentStore {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            bucket: config.storage_bucket.clone(),
            anon_key: config.anon_key.clone(),
        }
    }
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn store(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.anon_key)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|err| StorageError::Upload(err.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::Upload(format!(
                "storage returned {}",
                response.status()
            )));
        }

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_without_index() {
        assert_eq!(
            object_key("aadhaar", 1_700_000_000_123, None, "png"),
            "aadhaar/1700000000123.png"
        );
    }

    #[test]
    fn object_key_with_record_index() {
        assert_eq!(
            object_key("education", 1_700_000_000_123, Some(2), "pdf"),
            "education/1700000000123_2.pdf"
        );
    }

    #[test]
    fn public_url_points_into_the_bucket() {
        let store = RestDocumentStore::new(&BackendConfig {
            base_url: "https://backend.example.com".to_string(),
            anon_key: String::new(),
            storage_bucket: "hr-documents".to_string(),
        });
        assert_eq!(
            store.public_url("pan/1700000000123.png"),
            "https://backend.example.com/storage/v1/object/public/hr-documents/pan/1700000000123.png"
        );
    }
}
