//! Bind a sample service config from the process environment and print it as
//! JSON. Failures print the error envelope to stderr and exit non-zero.
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `warn`).

use envscan::{BindError, EnvRecord, Fallbacks, describe_record, read_environment};
use envscan_shared::ErrorEnvelope;
use serde::Serialize;
use std::io;
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Serialize, EnvRecord)]
#[serde(rename_all = "camelCase")]
struct ServiceConfig {
    #[env(key = "SERVICE_HOST")]
    host: String,
    #[env(key = "SERVICE_PORT")]
    port: i32,
    #[env(key = "SERVICE_DEBUG")]
    debug: bool,
    #[env(key = "SERVICE_FEATURES")]
    features: Vec<String>,
}

fn default_fallbacks() -> Fallbacks {
    [
        ("SERVICE_HOST", "127.0.0.1"),
        ("SERVICE_PORT", "8080"),
        ("SERVICE_DEBUG", "false"),
        ("SERVICE_FEATURES", "create,test"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(RunError::Bind(error)) => {
            let envelope = ErrorEnvelope::from(error);
            match serde_json::to_string_pretty(&envelope) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("error: {envelope}"),
            }
            ExitCode::from(1)
        },
        Err(RunError::Output(error)) => {
            eprintln!("error: {error}");
            ExitCode::from(1)
        },
    }
}

enum RunError {
    Bind(BindError),
    Output(Box<dyn std::error::Error>),
}

fn run() -> Result<(), RunError> {
    let mut config = ServiceConfig::default();
    tracing::debug!(fields = %describe_record(&config), "service config layout");
    read_environment(Some(&mut config), &default_fallbacks()).map_err(RunError::Bind)?;

    let mut output =
        serde_json::to_string_pretty(&config).map_err(|error| RunError::Output(error.into()))?;
    output.push('\n');

    let mut stdout = io::stdout();
    stdout
        .write_all(output.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|error| RunError::Output(error.into()))?;
    Ok(())
}
