//! Storage setup and initialization

use anyhow::Result;
use rendition_core::{Config, StorageBackend};
use rendition_storage::{create_local_storage, create_storage, LocalStorage, Storage};
use std::sync::Arc;

/// Setup the storage gateway; with the local backend, also return the concrete store so
/// the `/files` routes can be mounted on it.
pub async fn setup_storage(
    config: &Config,
) -> Result<(Arc<dyn Storage>, Option<Arc<LocalStorage>>)> {
    tracing::info!("Initializing storage gateway...");

    let (storage, local): (Arc<dyn Storage>, Option<Arc<LocalStorage>>) =
        match config.storage.backend {
            StorageBackend::Local => {
                let local = create_local_storage(&config.storage).await?;
                let storage: Arc<dyn Storage> = local.clone();
                (storage, Some(local))
            }
            StorageBackend::S3 => (create_storage(&config.storage).await?, None),
        };

    tracing::info!(
        backend = ?storage.backend_type(),
        input_bucket = %config.storage.input_bucket,
        output_bucket = %config.storage.output_bucket,
        "Storage gateway initialized successfully"
    );

    Ok((storage, local))
}
