//! Configuration module
//!
//! One `Config` is built at startup and passed explicitly to the storage gateway and
//! the HTTP layer. Nothing reads the environment after that.

use std::env;

use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:4000/files";

/// Storage configuration for the input (uploads) and output (renditions) buckets.
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub region: Option<String>,
    pub input_bucket: String,
    pub output_bucket: String,
    // Custom endpoint for S3-compatible providers (MinIO, LocalStack, ...)
    pub endpoint: Option<String>,
    // Static credentials are only expected in local development.
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub local_signing_secret: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub storage: StorageConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let backend = env::var("STORAGE_BACKEND")
            .ok()
            .map(|s| s.parse::<StorageBackend>())
            .transpose()?
            .unwrap_or(StorageBackend::S3);

        let storage = StorageConfig {
            backend,
            region: env::var("S3_REGION").or_else(|_| env::var("AWS_REGION")).ok(),
            input_bucket: env::var("S3_INPUT_BUCKET")
                .map_err(|_| anyhow::anyhow!("S3_INPUT_BUCKET must be set"))?,
            output_bucket: env::var("S3_OUTPUT_BUCKET")
                .map_err(|_| anyhow::anyhow!("S3_OUTPUT_BUCKET must be set"))?,
            endpoint: env::var("S3_ENDPOINT").ok(),
            access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .ok()
                .or_else(|| (backend == StorageBackend::Local).then(|| DEFAULT_LOCAL_BASE_URL.to_string())),
            local_signing_secret: env::var("LOCAL_STORAGE_SIGNING_SECRET").ok(),
        };

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            storage,
        };

        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let storage = &self.storage;
        if storage.input_bucket.trim().is_empty() || storage.output_bucket.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "S3_INPUT_BUCKET and S3_OUTPUT_BUCKET must not be empty"
            ));
        }

        if storage.access_key_id.is_some() != storage.secret_access_key.is_some() {
            return Err(anyhow::anyhow!(
                "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together"
            ));
        }

        match storage.backend {
            StorageBackend::S3 => {
                if storage.region.is_none() {
                    return Err(anyhow::anyhow!(
                        "AWS_REGION or S3_REGION must be set when using S3 storage backend"
                    ));
                }
                if self.is_production() && storage.access_key_id.is_some() {
                    tracing::warn!(
                        "Static AWS credentials configured in production; ambient credentials are preferred"
                    );
                }
            }
            StorageBackend::Local => {
                if storage.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                match storage.local_signing_secret.as_deref() {
                    Some(secret) if secret.len() >= 32 => {}
                    _ => {
                        return Err(anyhow::anyhow!(
                            "LOCAL_STORAGE_SIGNING_SECRET must be at least 32 characters long"
                        ))
                    }
                }
            }
        }

        Ok(())
    }
}
