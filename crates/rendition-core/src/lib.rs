//! Rendition Core Library
//!
//! Domain models, the rendition grid, error types and configuration shared by the
//! storage gateway, the HTTP API and the client.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod renditions;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, StorageConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{ArtifactEntry, CredentialRequest, DiscoveryResult, RenditionsBySize, UploadCredential};
pub use renditions::{base_name, content_type_for_key, rendition_grid, rendition_key, RenditionFormat, RenditionSize};
pub use storage_types::StorageBackend;
