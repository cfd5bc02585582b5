use crate::keys::{encode_key_path, validate_key, validate_upload_params};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use hmac::{Hmac, Mac};
use rendition_core::{content_type_for_key, UploadCredential};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Upload policy carried in the `policy` form field, base64-encoded JSON.
#[derive(Debug, Serialize, Deserialize)]
struct LocalUploadPolicy {
    bucket: String,
    key: String,
    content_type: String,
    min_bytes: u64,
    max_bytes: u64,
    /// Unix seconds
    expires_at: i64,
}

/// Local filesystem storage implementation
///
/// Objects live at `{base_path}/{bucket}/{key}`. Read URLs and upload credentials are
/// HMAC-SHA256 signed with a server secret and verified by the `/files` routes.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    secret: Vec<u8>,
    buckets: Vec<String>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory, one subdirectory per bucket
    /// * `base_url` - Base URL the `/files` routes are served under (e.g., "http://localhost:4000/files")
    /// * `secret` - HMAC key for read URLs and upload policies
    /// * `buckets` - Bucket names this gateway may touch
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        secret: impl Into<Vec<u8>>,
        buckets: &[String],
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        for bucket in buckets {
            let dir = base_path.join(bucket);
            fs::create_dir_all(&dir).await.map_err(|e| {
                StorageError::Config(format!(
                    "Failed to create storage directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret: secret.into(),
            buckets: buckets.to_vec(),
        })
    }

    fn check_bucket(&self, bucket: &str) -> StorageResult<()> {
        if self.buckets.iter().any(|b| b == bucket) {
            Ok(())
        } else {
            Err(StorageError::InvalidInput(format!("Unknown bucket: {}", bucket)))
        }
    }

    /// Convert bucket and key to a filesystem path, refusing anything that could escape
    /// the bucket directory.
    fn key_to_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        self.check_bucket(bucket)?;
        validate_key(key)?;
        if key.starts_with('/')
            || key.contains('\\')
            || key.split('/').any(|segment| segment == ".." || segment == ".")
        {
            return Err(StorageError::InvalidInput(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(bucket).join(key))
    }

    fn mac(&self) -> Hmac<Sha256> {
        Hmac::<Sha256>::new_from_slice(&self.secret).expect("HMAC accepts any key size")
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn verify(&self, payload: &str, signature: &str) -> StorageResult<()> {
        let provided = hex::decode(signature)
            .map_err(|_| StorageError::InvalidInput("Malformed signature".to_string()))?;
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&provided)
            .map_err(|_| StorageError::InvalidInput("Signature mismatch".to_string()))
    }

    fn read_payload(bucket: &str, key: &str, expires: i64) -> String {
        format!("GET\n{}\n{}\n{}", bucket, key, expires)
    }

    /// Check a read URL's `expires` and `signature` query parameters.
    pub fn verify_read(
        &self,
        bucket: &str,
        key: &str,
        expires: i64,
        signature: &str,
    ) -> StorageResult<()> {
        if expires < chrono::Utc::now().timestamp() {
            return Err(StorageError::InvalidInput("Read URL has expired".to_string()));
        }
        self.verify(&Self::read_payload(bucket, key, expires), signature)
    }

    /// Read an object's bytes along with a content type guessed from its extension.
    pub async fn read_object(&self, bucket: &str, key: &str) -> StorageResult<(Bytes, &'static str)> {
        if !self.exists(bucket, key).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }
        let path = self.key_to_path(bucket, key)?;
        match fs::read(&path).await {
            Ok(data) => Ok((Bytes::from(data), content_type_for_key(key))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Write an object directly. Used by the upload route after policy checks and to
    /// seed fixtures.
    pub async fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.key_to_path(bucket, key)?;
        ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(())
    }

    /// Accept a form upload made with a credential from `presigned_upload`.
    ///
    /// `fields` are the non-file form parts. The signed policy must match the bucket,
    /// the `key` and `Content-Type` fields, must not have expired, and must admit the
    /// payload size. Returns the stored key.
    pub async fn accept_upload(
        &self,
        bucket: &str,
        fields: &BTreeMap<String, String>,
        data: &[u8],
    ) -> StorageResult<String> {
        let field = |name| form_field(fields, name);

        let encoded = field("policy")?;
        self.verify(&format!("POST\n{}", encoded), field("x-signature")?)?;

        let raw = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| StorageError::InvalidInput("Malformed policy".to_string()))?;
        let policy: LocalUploadPolicy = serde_json::from_slice(&raw)
            .map_err(|_| StorageError::InvalidInput("Malformed policy".to_string()))?;

        if policy.bucket != bucket {
            return Err(StorageError::InvalidInput("Policy bucket mismatch".to_string()));
        }
        if field("key")? != &policy.key {
            return Err(StorageError::InvalidInput("Policy key mismatch".to_string()));
        }
        if field("Content-Type")? != &policy.content_type {
            return Err(StorageError::InvalidInput(
                "Policy content type mismatch".to_string(),
            ));
        }
        if policy.expires_at < chrono::Utc::now().timestamp() {
            return Err(StorageError::InvalidInput("Upload policy has expired".to_string()));
        }
        let size = data.len() as u64;
        if size < policy.min_bytes || size > policy.max_bytes {
            return Err(StorageError::InvalidInput(format!(
                "Upload size {} outside allowed range {}..={}",
                size, policy.min_bytes, policy.max_bytes
            )));
        }

        self.put_object(bucket, &policy.key, data).await?;
        Ok(policy.key)
    }
}

fn form_field<'a>(fields: &'a BTreeMap<String, String>, name: &str) -> StorageResult<&'a String> {
    fields
        .get(name)
        .ok_or_else(|| StorageError::InvalidInput(format!("Missing form field: {}", name)))
}

async fn ensure_parent_dir(path: &Path) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[async_trait]
impl Storage for LocalStorage {
    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(bucket, key)?;
        // a key that is only a prefix of other keys is a directory here, not an object
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
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

        let expires = chrono::Utc::now().timestamp() + expires_in.as_secs() as i64;
        let signature = self.sign(&Self::read_payload(bucket, key, expires));

        Ok(format!(
            "{}/{}/{}?expires={}&signature={}",
            self.base_url,
            bucket,
            encode_key_path(key),
            expires,
            signature
        ))
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
        self.key_to_path(bucket, key)?;

        let policy = LocalUploadPolicy {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            min_bytes: *size_range.start(),
            max_bytes: *size_range.end(),
            expires_at: chrono::Utc::now().timestamp() + expires_in.as_secs() as i64,
        };
        let json = serde_json::to_vec(&policy)
            .map_err(|e| StorageError::Gateway(format!("Failed to encode policy: {}", e)))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(json);
        let signature = self.sign(&format!("POST\n{}", encoded));

        let mut fields = BTreeMap::new();
        fields.insert("key".to_string(), key.to_string());
        fields.insert("Content-Type".to_string(), content_type.to_string());
        fields.insert("policy".to_string(), encoded);
        fields.insert("x-signature".to_string(), signature);

        Ok(UploadCredential {
            post_url: format!("{}/{}", self.base_url, bucket),
            fields,
            expires_in: expires_in.as_secs(),
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(
            dir,
            "http://localhost:4000/files/".to_string(),
            SECRET,
            &["uploads".to_string(), "renditions".to_string()],
        )
        .await
        .unwrap()
    }

    fn query_param<'a>(url: &'a str, name: &str) -> &'a str {
        let query = url.split_once('?').unwrap().1;
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix(&format!("{}=", name)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_exists_and_signed_read_url() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        assert!(!storage.exists("renditions", "720p/cat.webp").await.unwrap());
        let err = storage
            .signed_read_url("renditions", "720p/cat.webp", Duration::from_secs(3600))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));

        storage
            .put_object("renditions", "720p/cat.webp", b"webp")
            .await
            .unwrap();
        assert!(storage.exists("renditions", "720p/cat.webp").await.unwrap());

        let url = storage
            .signed_read_url("renditions", "720p/cat.webp", Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:4000/files/renditions/720p/cat.webp?expires="));

        let expires: i64 = query_param(&url, "expires").parse().unwrap();
        let signature = query_param(&url, "signature");
        storage
            .verify_read("renditions", "720p/cat.webp", expires, signature)
            .unwrap();
        assert!(storage
            .verify_read("renditions", "480p/cat.webp", expires, signature)
            .is_err());
    }

    #[tokio::test]
    async fn test_key_prefix_is_not_an_object() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        storage.put_object("uploads", "album/cat.png", b"png").await.unwrap();

        assert!(storage.exists("uploads", "album/cat.png").await.unwrap());
        assert!(!storage.exists("uploads", "album").await.unwrap());
        let err = storage
            .signed_read_url("uploads", "album", Duration::from_secs(3600))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        let err = storage.read_object("uploads", "album").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_expired_read_url_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let expires = chrono::Utc::now().timestamp() - 1;
        let signature = storage.sign(&LocalStorage::read_payload("uploads", "cat.png", expires));
        let err = storage
            .verify_read("uploads", "cat.png", expires, &signature)
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_read_object_content_type() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        storage.put_object("renditions", "480p/cat.jpg", b"jpg").await.unwrap();

        let (data, content_type) = storage.read_object("renditions", "480p/cat.jpg").await.unwrap();
        assert_eq!(&data[..], b"jpg");
        assert_eq!(content_type, "image/jpeg");

        let err = storage.read_object("renditions", "480p/dog.jpg").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.exists("uploads", "../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidInput(_))));

        let result = storage.exists("uploads", "/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidInput(_))));

        let result = storage.exists("secrets", "cat.png").await;
        assert!(matches!(result, Err(StorageError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_upload_round_trip_through_policy() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let credential = storage
            .presigned_upload("uploads", "cat.png", "image/png", 1..=16, Duration::from_secs(900))
            .await
            .unwrap();
        assert_eq!(credential.post_url, "http://localhost:4000/files/uploads");
        assert_eq!(credential.expires_in, 900);

        let key = storage
            .accept_upload("uploads", &credential.fields, b"png bytes")
            .await
            .unwrap();
        assert_eq!(key, "cat.png");
        assert!(storage.exists("uploads", "cat.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_upload_policy_enforced() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let credential = storage
            .presigned_upload("uploads", "cat.png", "image/png", 1..=4, Duration::from_secs(900))
            .await
            .unwrap();

        // too large
        let err = storage
            .accept_upload("uploads", &credential.fields, b"12345")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidInput(_)));

        // empty
        assert!(storage.accept_upload("uploads", &credential.fields, b"").await.is_err());

        // key swapped after signing
        let mut tampered = credential.fields.clone();
        tampered.insert("key".to_string(), "dog.png".to_string());
        assert!(storage.accept_upload("uploads", &tampered, b"12").await.is_err());

        // content type swapped after signing
        let mut tampered = credential.fields.clone();
        tampered.insert("Content-Type".to_string(), "image/gif".to_string());
        assert!(storage.accept_upload("uploads", &tampered, b"12").await.is_err());

        // wrong bucket
        assert!(storage
            .accept_upload("renditions", &credential.fields, b"12")
            .await
            .is_err());

        assert!(!storage.exists("uploads", "cat.png").await.unwrap());
        assert!(!storage.exists("uploads", "dog.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_presigned_upload_rejects_empty_inputs() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let err = storage
            .presigned_upload("uploads", "", "image/png", 1..=4, Duration::from_secs(900))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidInput(_)));

        let err = storage
            .presigned_upload("uploads", "cat.png", "", 1..=4, Duration::from_secs(900))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidInput(_)));
    }
}
