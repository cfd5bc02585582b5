use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use rendition_core::{AppError, CredentialRequest, UploadCredential};
use std::sync::Arc;
use validator::Validate;

/// Issue a credential for a direct upload to storage
#[utoipa::path(
    post,
    path = "/credential",
    tag = "uploads",
    request_body = CredentialRequest,
    responses(
        (status = 200, description = "Upload credential issued", body = UploadCredential),
        (status = 400, description = "Missing filename or content type", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(
        filename = %request.filename,
        content_type = %request.content_type,
        operation = "issue_credential"
    )
)]
pub async fn issue_credential(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CredentialRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let credential = state
        .issuer
        .issue(&request.filename, &request.content_type)
        .await?;

    Ok(Json(credential))
}
