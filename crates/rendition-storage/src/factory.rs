#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use rendition_core::StorageConfig;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Arc<dyn Storage>> {
    match config.backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let region = config.region.clone().ok_or_else(|| {
                StorageError::Config("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let credentials = match (&config.access_key_id, &config.secret_access_key) {
                (Some(id), Some(secret)) => Some(crate::s3::StaticCredentials {
                    access_key_id: id.clone(),
                    secret_access_key: secret.clone(),
                }),
                _ => None,
            };

            let storage = S3Storage::new(
                &buckets(config),
                region,
                config.endpoint.clone(),
                credentials,
            )?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::Config(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => Ok(create_local_storage(config).await?),

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::Config(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

/// Create the local backend as a concrete type, so the HTTP layer can also mount the
/// `/files` routes on it.
#[cfg(feature = "storage-local")]
pub async fn create_local_storage(config: &StorageConfig) -> StorageResult<Arc<LocalStorage>> {
    let base_path = config
        .local_storage_path
        .clone()
        .ok_or_else(|| StorageError::Config("LOCAL_STORAGE_PATH not configured".to_string()))?;
    let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
        StorageError::Config("LOCAL_STORAGE_BASE_URL not configured".to_string())
    })?;
    let secret = config.local_signing_secret.clone().ok_or_else(|| {
        StorageError::Config("LOCAL_STORAGE_SIGNING_SECRET not configured".to_string())
    })?;

    let storage = LocalStorage::new(base_path, base_url, secret, &buckets(config)).await?;
    Ok(Arc::new(storage))
}

fn buckets(config: &StorageConfig) -> Vec<String> {
    let mut buckets = vec![config.input_bucket.clone()];
    if config.output_bucket != config.input_bucket {
        buckets.push(config.output_bucket.clone());
    }
    buckets
}
