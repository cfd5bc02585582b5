//! HTTP client for the rendition API.
//!
//! Requests upload credentials, performs the direct multipart upload against the
//! storage endpoint named in the credential, and queries discovery. The
//! [`poller`] module drives discovery until renditions show up.

pub mod poller;

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use rendition_core::{CredentialRequest, DiscoveryResult, UploadCredential};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub use poller::{DiscoveryPoller, DiscoverySource, PollError, PollPolicy, PollState};

/// HTTP client for the rendition API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create client from environment: RENDITION_API_URL (or API_URL).
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("RENDITION_API_URL")
            .or_else(|_| std::env::var("API_URL"))
            .unwrap_or_else(|_| "http://localhost:4000".to_string());

        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.build_url(path);
        let mut request = self.client.get(&url);

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.context("Failed to send request")?;
        let response = error_for_status(response).await?;

        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.build_url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;
        let response = error_for_status(response).await?;

        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }

    /// Request a direct-upload credential for `filename`.
    pub async fn issue_upload_credential(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<UploadCredential> {
        let body = CredentialRequest {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
        };
        self.post_json("/credential", &body).await
    }

    /// Query which artifacts currently exist for a source key.
    pub async fn discover(&self, key: &str) -> Result<DiscoveryResult> {
        self.get("/discovery", &[("key", key.to_string())]).await
    }

    /// Upload bytes straight to storage with a credential.
    ///
    /// Every credential field goes into the form ahead of the file part, which is
    /// the order POST-policy endpoints require.
    pub async fn upload_with_credential(
        &self,
        credential: &UploadCredential,
        data: Vec<u8>,
        filename: &str,
    ) -> Result<()> {
        let content_type = credential
            .fields
            .get("Content-Type")
            .context("Credential has no Content-Type field")?;

        let mut form = reqwest::multipart::Form::new();
        for (name, value) in &credential.fields {
            form = form.text(name.clone(), value.clone());
        }
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .context("Invalid content type in credential")?;
        form = form.part("file", part);

        let response = self
            .client
            .post(&credential.post_url)
            .multipart(form)
            .send()
            .await
            .context("Failed to send upload")?;
        error_for_status(response).await?;

        tracing::debug!(key = ?credential.key(), "Upload accepted by storage");
        Ok(())
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

async fn error_for_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(anyhow::anyhow!(
        "Request failed with status {}: {}",
        status,
        error_text
    ))
}
