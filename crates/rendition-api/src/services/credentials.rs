//! Upload credential issuer
//!
//! Hands out a direct-to-storage upload credential for one key in the input bucket.
//! The size range and lifetime are fixed by policy; the caller only chooses the key
//! and the content type. Keys are not made unique, so a second upload to the same
//! filename replaces the first.

use rendition_core::constants::{UPLOAD_CREDENTIAL_TTL, UPLOAD_MAX_BYTES, UPLOAD_MIN_BYTES};
use rendition_core::{AppError, UploadCredential};
use rendition_storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct UploadCredentialIssuer {
    storage: Arc<dyn Storage>,
    input_bucket: String,
}

impl UploadCredentialIssuer {
    pub fn new(storage: Arc<dyn Storage>, input_bucket: String) -> Self {
        Self {
            storage,
            input_bucket,
        }
    }

    #[tracing::instrument(skip(self), fields(operation = "issue_upload_credential"))]
    pub async fn issue(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<UploadCredential, AppError> {
        if filename.is_empty() {
            return Err(AppError::InvalidInput("filename is required".to_string()));
        }
        if content_type.is_empty() {
            return Err(AppError::InvalidInput("contentType is required".to_string()));
        }

        let credential = self
            .storage
            .presigned_upload(
                &self.input_bucket,
                filename,
                content_type,
                UPLOAD_MIN_BYTES..=UPLOAD_MAX_BYTES,
                UPLOAD_CREDENTIAL_TTL,
            )
            .await?;

        tracing::info!(
            bucket = %self.input_bucket,
            key = %filename,
            content_type = %content_type,
            expires_in = credential.expires_in,
            "Issued upload credential"
        );

        Ok(credential)
    }
}
