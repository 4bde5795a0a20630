//! # envscan
//!
//! Populate configuration records from environment variables.
//!
//! A record is a struct deriving [`EnvRecord`]; each field names its env var
//! with `#[env(key = "NAME")]`. [`bind`] resolves every field in declaration
//! order:
//! - the source value, when set and non-empty
//! - otherwise the fallback value, when present and non-empty
//! - otherwise the call fails with [`BindError::MissingValue`]
//!
//! Supported field types are `String`, `bool`, the signed integers and
//! `Vec<String>` (comma separated). Errors convert into
//! [`envscan_shared::ErrorEnvelope`] for structured reporting.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

extern crate self as envscan;

pub mod bind;
pub mod convert;
pub mod error;
pub mod record;
pub mod source;

pub use bind::{Fallbacks, bind, read_environment};
pub use convert::{ConversionError, ConversionTarget};
pub use envscan_derive::EnvRecord;
pub use error::BindError;
pub use record::{
    EnvRecord, EnvTarget, FieldDescriptor, FieldKind, FieldSlot, IntSlot, IntWidth,
    describe_record,
};
pub use source::{EnvSource, ProcessEnv};

/// Returns the envscan crate version.
#[must_use]
pub const fn envscan_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
