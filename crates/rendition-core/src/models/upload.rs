use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::Validate;

/// Request for a direct-upload credential.
///
/// Missing fields deserialize as empty strings so they are rejected by validation
/// with a 400 rather than by the JSON extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequest {
    /// Destination key in the input bucket
    #[serde(default)]
    #[validate(length(min = 1, max = 1024, message = "filename must be between 1 and 1024 characters"))]
    pub filename: String,
    /// MIME type the upload must carry
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "contentType must be between 1 and 255 characters"))]
    pub content_type: String,
}

/// Scoped, time-limited write capability for exactly one key.
///
/// The client POSTs a multipart form to `post_url` containing every entry of
/// `fields` followed by the file itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadCredential {
    #[serde(rename = "postURL")]
    pub post_url: String,
    pub fields: BTreeMap<String, String>,
    /// Seconds until the credential stops being accepted
    #[serde(rename = "expiresIn")]
    pub expires_in: u64,
}

impl UploadCredential {
    /// Destination key the credential is scoped to.
    pub fn key(&self) -> Option<&str> {
        self.fields.get("key").map(String::as_str)
    }
}
