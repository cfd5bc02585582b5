pub mod discovery;
pub mod upload;

pub use discovery::{ArtifactEntry, DiscoveryResult, RenditionsBySize};
pub use upload::{CredentialRequest, UploadCredential};
