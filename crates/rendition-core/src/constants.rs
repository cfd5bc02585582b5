//! System-wide policy constants.
//!
//! These are fixed by policy and never taken from the caller.

use std::time::Duration;

/// Validity of signed read URLs handed out by discovery.
pub const READ_URL_TTL: Duration = Duration::from_secs(3600);

/// Validity of an upload credential.
pub const UPLOAD_CREDENTIAL_TTL: Duration = Duration::from_secs(900);

/// Smallest accepted upload, in bytes.
pub const UPLOAD_MIN_BYTES: u64 = 1;

/// Largest accepted upload, in bytes.
pub const UPLOAD_MAX_BYTES: u64 = 10_000_000;

/// Default number of discovery calls before the client gives up.
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 15;

/// Default wait between two discovery calls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
