use crate::keys::{validate_key, validate_upload_params};
use crate::post_policy::{PostPolicy, SigningCredentials};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{CredentialProvider, ObjectStoreExt};
use rendition_core::UploadCredential;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Static credentials for local development. Production uses the ambient chain
/// (environment, instance profile, web identity) resolved by `object_store`.
#[derive(Clone, Debug)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// S3 storage implementation
///
/// Holds one `AmazonS3` store per configured bucket; requests naming any other bucket
/// are rejected.
#[derive(Clone)]
pub struct S3Storage {
    stores: HashMap<String, AmazonS3>,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `buckets` - Bucket names this gateway may touch (input and output)
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `credentials` - Optional static credentials; `None` uses the ambient chain
    pub fn new(
        buckets: &[String],
        region: String,
        endpoint_url: Option<String>,
        credentials: Option<StaticCredentials>,
    ) -> StorageResult<Self> {
        let mut stores = HashMap::with_capacity(buckets.len());

        for bucket in buckets {
            let mut builder = AmazonS3Builder::from_env()
                .with_region(region.clone())
                .with_bucket_name(bucket.clone());

            if let Some(ref endpoint) = endpoint_url {
                let allow_http = endpoint.starts_with("http://");
                builder = builder
                    .with_endpoint(endpoint.clone())
                    .with_allow_http(allow_http)
                    .with_virtual_hosted_style_request(false);
            }

            if let Some(ref creds) = credentials {
                builder = builder
                    .with_access_key_id(creds.access_key_id.clone())
                    .with_secret_access_key(creds.secret_access_key.clone());
            }

            let store = builder
                .build()
                .map_err(|e| StorageError::Config(e.to_string()))?;
            stores.insert(bucket.clone(), store);
        }

        tracing::debug!(
            region = %region,
            endpoint = ?endpoint_url,
            bucket_count = stores.len(),
            "S3 gateway configured"
        );

        Ok(S3Storage {
            stores,
            region,
            endpoint_url,
        })
    }

    fn store(&self, bucket: &str) -> StorageResult<&AmazonS3> {
        self.stores
            .get(bucket)
            .ok_or_else(|| StorageError::InvalidInput(format!("Unknown bucket: {}", bucket)))
    }

    /// Presigned GET for a key, without checking that it exists. Signing is local.
    async fn sign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> StorageResult<String> {
        validate_key(key)?;
        let store = self.store(bucket)?;
        let url = store
            .signed_url(Method::GET, &Path::from(key), expires_in)
            .await
            .map_err(|e| StorageError::Gateway(e.to_string()))?;

        Ok(url.to_string())
    }

    /// Form POST target for a bucket.
    ///
    /// For AWS S3: https://{bucket}.s3.{region}.amazonaws.com/
    /// For S3-compatible providers: path-style {endpoint}/{bucket}
    fn bucket_url(&self, bucket: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            format!("{}/{}", endpoint.trim_end_matches('/'), bucket)
        } else {
            format!("https://{}.s3.{}.amazonaws.com/", bucket, self.region)
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let store = self.store(bucket)?;
        let location = Path::from(key);
        let start = std::time::Instant::now();

        match store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 head failed"
                );
                Err(StorageError::Gateway(e.to_string()))
            }
        }
    }

    async fn signed_read_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        if !self.exists(bucket, key).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }

        self.sign_get(bucket, key, expires_in).await
    }

    async fn presigned_upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        size_range: RangeInclusive<u64>,
        expires_in: Duration,
    ) -> StorageResult<UploadCredential> {
        validate_upload_params(key, content_type, &size_range)?;
        let store = self.store(bucket)?;

        let credential = store
            .credentials()
            .get_credential()
            .await
            .map_err(|e| StorageError::Gateway(format!("Failed to resolve credentials: {}", e)))?;

        let policy = PostPolicy {
            bucket,
            key,
            content_type,
            size_range,
            region: &self.region,
            expires_in,
        };
        let fields = policy.sign(
            &SigningCredentials {
                key_id: &credential.key_id,
                secret_key: &credential.secret_key,
                token: credential.token.as_deref(),
            },
            chrono::Utc::now(),
        );

        tracing::info!(
            bucket = %bucket,
            key = %key,
            content_type = %content_type,
            expires_in_secs = expires_in.as_secs(),
            "Issued S3 POST policy"
        );

        Ok(UploadCredential {
            post_url: self.bucket_url(bucket),
            fields,
            expires_in: expires_in.as_secs(),
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
