//! [`PhotoStorage`] for photos served from a public bucket URL.

use async_trait::async_trait;

use crate::collaborators::{PhotoStorage, StorageError};

/// Resolves photo references against a public base URL.
///
/// Absolute `http(s)` references pass through unchanged. Relative ones
/// are joined onto `base_url`; without a base URL they cannot be resolved.
#[derive(Debug, Clone, Default)]
pub struct PublicUrlStorage {
    base_url: Option<String>,
}

impl PublicUrlStorage {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());
        Self { base_url }
    }

    /// Read `STORAGE_PUBLIC_BASE_URL`.
    pub fn from_env() -> Self {
        let storage = Self::new(std::env::var("STORAGE_PUBLIC_BASE_URL").ok());
        if storage.base_url.is_none() {
            tracing::warn!("STORAGE_PUBLIC_BASE_URL not set, only absolute photo URLs will resolve");
        }
        storage
    }

    fn resolve(&self, photo_ref: &str) -> Result<String, StorageError> {
        let photo_ref = photo_ref.trim();
        if photo_ref.is_empty() {
            return Err(StorageError::NotFound("empty photo reference".to_string()));
        }
        if photo_ref.starts_with("https://") || photo_ref.starts_with("http://") {
            return Ok(photo_ref.to_string());
        }
        match &self.base_url {
            Some(base) => Ok(format!("{base}/{}", photo_ref.trim_start_matches('/'))),
            None => Err(StorageError::NotFound(format!(
                "{photo_ref} (no public storage base URL configured)"
            ))),
        }
    }
}

#[async_trait]
impl PhotoStorage for PublicUrlStorage {
    async fn resolve_public_url(&self, photo_ref: &str) -> Result<String, StorageError> {
        self.resolve(photo_ref)
    }
}
