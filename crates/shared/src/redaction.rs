//! Secret detection for environment variable names.
//!
//! Env values never show up in error messages; when they are attached as
//! diagnostic metadata they pass through [`redact_if_secret`] first.

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

const SECRET_MARKERS: [&str; 6] = ["KEY", "TOKEN", "SECRET", "PASSWORD", "CREDENTIAL", "AUTH"];

/// Checks if an env var name likely refers to a secret.
///
/// Matching is case-insensitive and substring based.
///
/// # Examples
///
/// ```
/// use envscan_shared::is_secret_key;
///
/// assert!(is_secret_key("APP_API_KEY"));
/// assert!(is_secret_key("db_password"));
/// assert!(!is_secret_key("APP_PORT"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    SECRET_MARKERS.iter().any(|marker| key.contains(marker))
}

/// Returns [`REDACTED`] for secret keys, or the original value otherwise.
///
/// # Examples
///
/// ```
/// use envscan_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("APP_TOKEN", "abc"), "[REDACTED]");
/// assert_eq!(redact_if_secret("APP_DEBUG", "yes"), "yes");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}
