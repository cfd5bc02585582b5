//! Storage gateway trait
//!
//! This module defines the `Storage` trait every backend implements, and the error
//! taxonomy callers rely on to tell "absent" apart from "unknown".

use crate::StorageBackend;
use async_trait::async_trait;
use rendition_core::{AppError, UploadCredential};
use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The object does not exist. Expected while renditions are still being produced.
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Any failure other than not-found: permissions, network, malformed response.
    #[error("Storage gateway error: {0}")]
    Gateway(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(key),
            StorageError::InvalidInput(msg) => AppError::InvalidInput(msg),
            other => AppError::Gateway(other.to_string()),
        }
    }
}

/// Storage gateway
///
/// All operations are read or metadata only. `presigned_upload` grants a future write
/// capability but writes nothing itself.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check whether an object is present.
    ///
    /// Returns `Ok(false)` for not-found and never `StorageError::NotFound`; every other
    /// failure is surfaced as an error so callers can distinguish absent from unknown.
    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool>;

    /// Generate a time-limited read URL for one object.
    ///
    /// Fails with `StorageError::NotFound` if the object is absent at call time.
    async fn signed_read_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Generate a form-upload credential scoped to exactly one key.
    ///
    /// The credential constrains the content type and the accepted size range (bytes,
    /// inclusive). Fails with `StorageError::InvalidInput` if key or content type is empty.
    async fn presigned_upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        size_range: RangeInclusive<u64>,
        expires_in: Duration,
    ) -> StorageResult<UploadCredential>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
