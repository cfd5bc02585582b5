use axum_test::multipart::{MultipartForm, Part};
use rendition_core::UploadCredential;

/// Multipart form for a credential: every credential field, then the file part.
pub fn upload_form(credential: &UploadCredential, data: Vec<u8>, content_type: &str) -> MultipartForm {
    let mut form = MultipartForm::new();
    for (name, value) in &credential.fields {
        form = form.add_text(name.clone(), value.clone());
    }
    form.add_part(
        "file",
        Part::bytes(data)
            .file_name("upload.bin")
            .mime_type(content_type.to_string()),
    )
}

/// Path part of a credential's post URL as served by the test app.
pub fn post_path(credential: &UploadCredential) -> &str {
    super::local_path(&credential.post_url)
}
