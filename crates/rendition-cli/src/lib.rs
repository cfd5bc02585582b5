use anyhow::{Context, Result};
use std::path::Path;

/// Storage key for a local file: its file name.
pub fn key_for_path(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .with_context(|| format!("Not a file path: {}", path.display()))
}

/// Explicit content type, or one guessed from the file name.
pub fn resolve_content_type(explicit: Option<&str>, key: &str) -> String {
    explicit
        .map(str::to_string)
        .unwrap_or_else(|| rendition_core::content_type_for_key(key).to_string())
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
