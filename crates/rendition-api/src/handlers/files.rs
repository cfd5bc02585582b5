//! Object serving and form uploads for the local storage backend.
//!
//! These routes stand in for the object store when running on a filesystem: they
//! verify the HMAC-signed read URLs and upload policies produced by `LocalStorage`.
//! With S3, clients talk to the bucket directly and these routes are not mounted.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use rendition_core::AppError;
use rendition_storage::LocalStorage;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SignedReadParams {
    pub expires: Option<i64>,
    pub signature: Option<String>,
}

fn local_storage(state: &AppState) -> Result<&Arc<LocalStorage>, AppError> {
    state
        .local
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Local file serving is not enabled".to_string()))
}

/// Serve one object if the URL signature verifies and has not expired.
#[tracing::instrument(skip(state, params), fields(operation = "serve_file"))]
pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    Query(params): Query<SignedReadParams>,
) -> Result<impl IntoResponse, HttpAppError> {
    let local = local_storage(&state)?;
    let (expires, signature) = match (params.expires, params.signature) {
        (Some(expires), Some(signature)) => (expires, signature),
        _ => {
            return Err(AppError::InvalidInput(
                "expires and signature are required".to_string(),
            )
            .into())
        }
    };

    local.verify_read(&bucket, &key, expires, &signature)?;
    let (data, content_type) = local.read_object(&bucket, &key).await?;

    Ok(([(header::CONTENT_TYPE, content_type)], data))
}

/// Accept a multipart form built from a local upload credential.
///
/// Every non-file part is a credential field; the `file` part carries the bytes.
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let local = local_storage(&state)?;

    let mut fields = BTreeMap::new();
    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read file part: {}", e)))?;
            data = Some(bytes);
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read field {}: {}", name, e)))?;
            fields.insert(name, value);
        }
    }

    let data = data.ok_or_else(|| AppError::InvalidInput("Missing file part".to_string()))?;
    let key = local.accept_upload(&bucket, &fields, &data).await?;

    tracing::info!(bucket = %bucket, key = %key, size_bytes = data.len(), "Accepted form upload");

    Ok(StatusCode::NO_CONTENT)
}
