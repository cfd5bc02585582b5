//! Rendition Storage Library
//!
//! The storage gateway: existence probes, time-limited read URLs and time-limited
//! upload credentials against an object store with two buckets, one for uploads and
//! one for renditions.
//!
//! # Backends
//!
//! - **S3** (`storage-s3`): `object_store` for probes and signed GETs, SigV4 POST
//!   policies for upload credentials.
//! - **Local** (`storage-local`): filesystem layout `{base}/{bucket}/{key}` with
//!   HMAC-signed URLs and upload policies, for development and tests.
//!
//! Keys must not be empty; the local backend also rejects `..` and a leading `/`.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;
pub mod post_policy;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use factory::create_local_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(any(test, feature = "test-helpers"))]
pub use mock::{MockFailure, MockStorage};
pub use rendition_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
