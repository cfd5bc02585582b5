//! Application state shared by all handlers.

use crate::services::{ArtifactScanner, UploadCredentialIssuer};
use rendition_core::Config;
use rendition_storage::{LocalStorage, Storage};
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub scanner: ArtifactScanner,
    pub issuer: UploadCredentialIssuer,
    /// Set only with the local backend, which also serves `/files`.
    pub local: Option<Arc<LocalStorage>>,
}

impl AppState {
    /// Wire services over a storage gateway.
    pub fn new(config: Config, storage: Arc<dyn Storage>, local: Option<Arc<LocalStorage>>) -> Self {
        let scanner = ArtifactScanner::new(
            storage.clone(),
            config.storage.input_bucket.clone(),
            config.storage.output_bucket.clone(),
        );
        let issuer = UploadCredentialIssuer::new(storage.clone(), config.storage.input_bucket.clone());

        Self {
            config,
            storage,
            scanner,
            issuer,
            local,
        }
    }
}
