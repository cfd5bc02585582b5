//! Rendition CLI: request upload credentials, upload directly to storage and wait
//! for renditions.
//!
//! Set RENDITION_API_URL (or API_URL).

use anyhow::Context;
use clap::{Parser, Subcommand};
use rendition_cli::{init_tracing, key_for_path, resolve_content_type};
use rendition_client::{ApiClient, DiscoveryPoller, PollError, PollPolicy};
use rendition_core::constants::{DEFAULT_POLL_INTERVAL, DEFAULT_POLL_MAX_ATTEMPTS};
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "rendition", about = "Rendition discovery CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Request an upload credential without uploading
    Credential {
        /// Destination key in the input bucket
        filename: String,
        /// MIME type the upload will carry
        #[arg(long)]
        content_type: String,
    },
    /// Upload a file and wait until its renditions can be discovered
    Upload {
        /// Path to the file to upload
        file: std::path::PathBuf,
        /// MIME type (guessed from the extension when omitted)
        #[arg(long)]
        content_type: Option<String>,
        /// Discovery calls before giving up
        #[arg(long, default_value_t = DEFAULT_POLL_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..))]
        max_attempts: u32,
        /// Wait between discovery calls, in milliseconds
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64)]
        interval_ms: u64,
    },
    /// Show what is currently available for a source key
    Discover {
        /// Source key, including its extension
        key: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let client = ApiClient::from_env()
        .context("Failed to create API client. Set RENDITION_API_URL (or API_URL)")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Credential {
            filename,
            content_type,
        } => {
            let credential = client
                .issue_upload_credential(&filename, &content_type)
                .await?;
            print_json(&credential)?;
        }
        Commands::Upload {
            file,
            content_type,
            max_attempts,
            interval_ms,
        } => {
            let key = key_for_path(&file)?;
            let content_type = resolve_content_type(content_type.as_deref(), &key);
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read file: {}", file.display()))?;

            let credential = client
                .issue_upload_credential(&key, &content_type)
                .await
                .context("Failed to get upload credential")?;
            client
                .upload_with_credential(&credential, data, &key)
                .await
                .context("Upload to storage failed")?;
            tracing::info!(%key, "Uploaded, waiting for renditions");

            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.cancel();
                }
            });

            let policy = PollPolicy {
                max_attempts,
                interval: Duration::from_millis(interval_ms),
            };
            let poller = DiscoveryPoller::new(client, policy).with_cancellation(cancel);

            match poller.run(&key).await {
                Ok(result) => print_json(&result)?,
                Err(PollError::Cancelled) => {
                    tracing::warn!("Cancelled");
                }
                Err(e @ PollError::Timeout { .. }) => return Err(e.into()),
            }
        }
        Commands::Discover { key } => {
            let result = client.discover(&key).await?;
            print_json(&result)?;
        }
    }

    Ok(())
}
