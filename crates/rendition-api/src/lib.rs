//! Rendition API Library
//!
//! This crate provides the HTTP handlers, the discovery and credential services, and
//! application setup.

// Module declarations
mod api_doc;
mod handlers;
mod middleware;
pub mod services;
pub mod setup;
mod telemetry;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::{ArtifactScanner, UploadCredentialIssuer};
pub use state::AppState;
