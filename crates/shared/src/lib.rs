//! # envscan-shared
//!
//! Error envelope and redaction helpers shared by the envscan crates.
//!
//! - [`ErrorEnvelope`] is the serializable error shape callers log or print
//! - [`is_secret_key`] decides which env values must never be echoed

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod errors;
pub mod redaction;

pub use errors::{ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use redaction::{REDACTED, is_secret_key, redact_if_secret};

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
