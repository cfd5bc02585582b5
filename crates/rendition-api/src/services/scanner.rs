//! Artifact matrix scanner
//!
//! For one source key, probes the original in the input bucket and every cell of the
//! rendition grid in the output bucket. All seven probes run concurrently and are joined
//! before the result is assembled, so latency is one storage round trip rather than seven.
//!
//! Absence is never an error here: a missing object is simply left out of the result.
//! Only an empty key or a gateway failure other than not-found fails the scan.

use futures::future::join_all;
use rendition_core::constants::READ_URL_TTL;
use rendition_core::{
    base_name, rendition_grid, rendition_key, AppError, ArtifactEntry, DiscoveryResult,
    RenditionFormat, RenditionSize, RenditionsBySize,
};
use rendition_storage::{Storage, StorageError, StorageResult};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct ArtifactScanner {
    storage: Arc<dyn Storage>,
    input_bucket: String,
    output_bucket: String,
    read_url_ttl: Duration,
}

impl ArtifactScanner {
    pub fn new(storage: Arc<dyn Storage>, input_bucket: String, output_bucket: String) -> Self {
        Self {
            storage,
            input_bucket,
            output_bucket,
            read_url_ttl: READ_URL_TTL,
        }
    }

    /// Discover the original and every rendition currently present for `source_key`.
    #[tracing::instrument(skip(self), fields(operation = "scan"))]
    pub async fn scan(&self, source_key: &str) -> Result<DiscoveryResult, AppError> {
        if source_key.is_empty() {
            return Err(AppError::InvalidInput("key is required".to_string()));
        }

        let base = base_name(source_key);
        let start = std::time::Instant::now();

        let cells = join_all(
            rendition_grid().map(|(size, format)| self.probe_rendition(base, size, format)),
        );
        let (original, cells) = futures::join!(self.probe_original(source_key), cells);

        let original = original?;
        let mut by_size = RenditionsBySize::default();
        // join_all keeps grid order, so webp precedes jpg within a size
        for cell in cells {
            if let Some((size, entry)) = cell? {
                by_size.get_mut(size).push(entry);
            }
        }

        let result = DiscoveryResult { original, by_size };
        tracing::debug!(
            source_key = %source_key,
            original = result.original.is_some(),
            renditions = result.available().len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Scan complete"
        );

        Ok(result)
    }

    async fn probe_original(&self, key: &str) -> StorageResult<Option<String>> {
        if !self.storage.exists(&self.input_bucket, key).await? {
            return Ok(None);
        }

        match self
            .storage
            .signed_read_url(&self.input_bucket, key, self.read_url_ttl)
            .await
        {
            Ok(url) => Ok(Some(url)),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    bucket = %self.input_bucket,
                    key = %key,
                    "Original present but could not be signed, reporting as absent"
                );
                Ok(None)
            }
        }
    }

    async fn probe_rendition(
        &self,
        base: &str,
        size: RenditionSize,
        format: RenditionFormat,
    ) -> StorageResult<Option<(RenditionSize, ArtifactEntry)>> {
        let key = rendition_key(base, size, format);
        if !self.storage.exists(&self.output_bucket, &key).await? {
            return Ok(None);
        }

        match self
            .storage
            .signed_read_url(&self.output_bucket, &key, self.read_url_ttl)
            .await
        {
            Ok(url) => Ok(Some((size, ArtifactEntry { format, url }))),
            // removed between probe and signing
            Err(StorageError::NotFound(_)) => {
                tracing::debug!(bucket = %self.output_bucket, key = %key, "Rendition vanished before signing");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
