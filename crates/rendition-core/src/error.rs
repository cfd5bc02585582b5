//! Request-level errors.
//!
//! Storage absence is not an error at this level: the scanner turns it into an empty
//! slot before it gets here. What does reach a client is described by
//! [`ErrorMetadata`], which the HTTP layer renders.

use std::error::Error as StdError;

/// How loudly an error is logged when it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Caller mistakes
    Debug,
    Warn,
    /// Failures the operator needs to see
    Error,
}

/// How an error is presented to a client.
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Machine-readable code, e.g. `STORAGE_ERROR`
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same request may succeed
    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Message safe to show to a client
    fn client_message(&self) -> String;

    /// Whether the internal message must stay server-side
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Any storage failure other than absence
    #[error("Storage gateway error: {0}")]
    Gateway(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error: {message}")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

const MAX_SOURCE_DEPTH: usize = 5;

impl AppError {
    /// Variant name, shown next to details outside production.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Gateway(_) => "Gateway",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// The message followed by up to five `Caused by:` lines from the source chain.
    pub fn detailed_message(&self) -> String {
        let mut details = self.to_string();
        let mut source = self.source();
        let mut depth = 0;

        while let Some(err) = source {
            if depth == MAX_SOURCE_DEPTH {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
            depth += 1;
        }

        details
    }

    fn is_server_fault(&self) -> bool {
        matches!(
            self,
            AppError::Gateway(_) | AppError::Internal(_) | AppError::InternalWithSource { .. }
        )
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        match self {
            AppError::InvalidInput(_) => 400,
            AppError::NotFound(_) => 404,
            _ => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Gateway(_) => "STORAGE_ERROR",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        self.is_server_fault()
    }

    fn suggested_action(&self) -> Option<&'static str> {
        Some(match self {
            AppError::InvalidInput(_) => "Check request parameters and try again",
            AppError::NotFound(_) => "Verify the object key exists",
            _ => "Retry after a short delay",
        })
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::Gateway(_) => "Failed to access storage".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }

    fn is_sensitive(&self) -> bool {
        self.is_server_fault()
    }

    fn log_level(&self) -> LogLevel {
        if self.is_server_fault() {
            LogLevel::Error
        } else {
            LogLevel::Debug
        }
    }
}
