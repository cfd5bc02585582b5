pub mod credentials;
pub mod scanner;

pub use credentials::UploadCredentialIssuer;
pub use scanner::ArtifactScanner;
