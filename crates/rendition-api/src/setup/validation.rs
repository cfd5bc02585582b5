//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use rendition_core::Config;

/// Validate critical configuration values
///
/// Runs the checks owned by `Config` and adds the ones that only matter for the
/// HTTP server.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    // Validate production mode detection
    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();
    if config.is_production() && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    if config.server_port == 0 {
        return Err(anyhow::anyhow!("PORT cannot be 0"));
    }

    if config.storage.input_bucket == config.storage.output_bucket {
        tracing::warn!(
            bucket = %config.storage.input_bucket,
            "Input and output buckets are the same - renditions and originals share a namespace"
        );
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}
