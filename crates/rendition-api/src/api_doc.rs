//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use rendition_core::{models, renditions};

/// Returns the OpenAPI spec served at `/api/openapi.json`.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rendition API",
        version = "0.1.0",
        description = "Direct-upload credentials and discovery of derived image renditions. Upload bytes go straight to object storage; discovery reports which renditions exist, each with a time-limited read URL."
    ),
    paths(
        handlers::credential::issue_credential,
        handlers::discovery::discover,
    ),
    components(
        schemas(
            models::CredentialRequest,
            models::UploadCredential,
            models::DiscoveryResult,
            models::RenditionsBySize,
            models::ArtifactEntry,
            renditions::RenditionFormat,
            renditions::RenditionSize,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "uploads", description = "Direct-upload credential issuance"),
        (name = "discovery", description = "Discovery of the original and its renditions")
    )
)]
pub struct ApiDoc;
