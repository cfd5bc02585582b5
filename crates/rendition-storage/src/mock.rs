//! In-memory storage gateway for tests
//!
//! Objects are tracked per `(bucket, key)`. Individual keys can be made to fail on
//! probe or on signing, and every call can be delayed, so callers can exercise
//! partial availability, gateway errors and concurrency on a paused clock.

use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use rendition_core::UploadCredential;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type ObjectId = (String, String);

/// How an injected failure surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Fails as if the object vanished (`StorageError::NotFound`)
    NotFound,
    /// Fails as a gateway error (permissions, network)
    Gateway,
}

impl MockFailure {
    fn to_error(self, key: &str) -> StorageError {
        match self {
            MockFailure::NotFound => StorageError::NotFound(key.to_string()),
            MockFailure::Gateway => StorageError::Gateway(format!("injected failure for {}", key)),
        }
    }
}

/// A recorded `presigned_upload` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignCall {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub size_range: RangeInclusive<u64>,
    pub expires_in: Duration,
}

/// Mock storage implementation that tracks objects in memory
#[derive(Clone, Default)]
pub struct MockStorage {
    objects: Arc<Mutex<HashSet<ObjectId>>>,
    exists_failures: Arc<Mutex<HashMap<ObjectId, MockFailure>>>,
    sign_failures: Arc<Mutex<HashMap<ObjectId, MockFailure>>>,
    presign_calls: Arc<Mutex<Vec<PresignCall>>>,
    latency: Option<Duration>,
    exists_calls: Arc<AtomicUsize>,
    sign_calls: Arc<AtomicUsize>,
}

fn id(bucket: &str, key: &str) -> ObjectId {
    (bucket.to_string(), key.to_string())
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every gateway call by `latency` (use with a paused tokio clock).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Add an object
    pub fn put(&self, bucket: &str, key: &str) {
        self.objects.lock().unwrap().insert(id(bucket, key));
    }

    /// Remove an object
    pub fn remove(&self, bucket: &str, key: &str) {
        self.objects.lock().unwrap().remove(&id(bucket, key));
    }

    /// Make `exists` fail for one key.
    pub fn fail_exists(&self, bucket: &str, key: &str, failure: MockFailure) {
        self.exists_failures
            .lock()
            .unwrap()
            .insert(id(bucket, key), failure);
    }

    /// Make `signed_read_url` fail for one key even when the object is present.
    pub fn fail_sign(&self, bucket: &str, key: &str, failure: MockFailure) {
        self.sign_failures
            .lock()
            .unwrap()
            .insert(id(bucket, key), failure);
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    pub fn presign_calls(&self) -> Vec<PresignCall> {
        self.presign_calls.lock().unwrap().clone()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        let object = id(bucket, key);
        if let Some(failure) = self.exists_failures.lock().unwrap().get(&object) {
            // exists never reports not-found as an error
            return match failure {
                MockFailure::NotFound => Ok(false),
                MockFailure::Gateway => Err(failure.to_error(key)),
            };
        }
        Ok(self.objects.lock().unwrap().contains(&object))
    }

    async fn signed_read_url(
        &self,
        bucket: &str,
        key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        let object = id(bucket, key);
        if let Some(failure) = self.sign_failures.lock().unwrap().get(&object) {
            return Err(failure.to_error(key));
        }
        if !self.objects.lock().unwrap().contains(&object) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(format!("mock://{}/{}", bucket, key))
    }

    async fn presigned_upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        size_range: RangeInclusive<u64>,
        expires_in: Duration,
    ) -> StorageResult<UploadCredential> {
        crate::keys::validate_upload_params(key, content_type, &size_range)?;
        self.delay().await;

        self.presign_calls.lock().unwrap().push(PresignCall {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            size_range,
            expires_in,
        });

        let mut fields = BTreeMap::new();
        fields.insert("key".to_string(), key.to_string());
        fields.insert("Content-Type".to_string(), content_type.to_string());
        Ok(UploadCredential {
            post_url: format!("mock://{}", bucket),
            fields,
            expires_in: expires_in.as_secs(),
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
