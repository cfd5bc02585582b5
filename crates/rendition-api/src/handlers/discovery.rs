use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use rendition_core::{AppError, DiscoveryResult};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DiscoveryQuery {
    /// Source key as uploaded, including its extension
    pub key: Option<String>,
}

/// Discover the original and the renditions currently available for a source key
///
/// Never cached: each call probes storage again. Sizes with nothing produced yet are
/// returned as empty lists.
#[utoipa::path(
    get,
    path = "/discovery",
    tag = "discovery",
    params(DiscoveryQuery),
    responses(
        (status = 200, description = "Artifacts currently available", body = DiscoveryResult),
        (status = 400, description = "Missing key", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query), fields(key = ?query.key, operation = "discover"))]
pub async fn discover(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DiscoveryQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let key = query
        .key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::InvalidInput("key is required".to_string()))?;

    let result = state.scanner.scan(&key).await?;

    Ok(Json(result))
}
