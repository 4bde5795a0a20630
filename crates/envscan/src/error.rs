//! Bind errors and their envelope mapping.

use crate::convert::{ConversionError, ConversionTarget};
use envscan_shared::{ErrorCode, ErrorEnvelope, redact_if_secret};

const ERROR_NAMESPACE: &str = "envscan";

/// Failure while binding a record. Every variant is terminal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    /// No target was supplied.
    #[error("bind target is nil")]
    NilTarget,
    /// The target does not resolve to a record.
    #[error("bind target must be a mutable reference to a record")]
    TargetNotStructPointer,
    /// A field declares no env key (or an empty one).
    #[error("record field \"{field}\" is missing its env key")]
    MissingTagMetadata {
        /// Field name.
        field: &'static str,
    },
    /// Neither the environment nor the fallbacks supplied a value.
    #[error("environment variable {key} not set")]
    MissingValue {
        /// Env var name.
        key: &'static str,
    },
    /// The value does not parse as the field's type.
    #[error("failed to parse {target} for field {field}")]
    TypeConversion {
        /// Field name.
        field: &'static str,
        /// Env var the value came from.
        key: &'static str,
        /// Conversion family.
        target: ConversionTarget,
        /// Parse failure.
        #[source]
        cause: ConversionError,
    },
    /// The record exposes no writable storage for the field.
    #[error("cannot assign to field {field}")]
    UnassignableField {
        /// Field name.
        field: &'static str,
    },
    /// The field's type is outside the supported set.
    #[error("unsupported field type {kind} for field {field}")]
    UnsupportedFieldType {
        /// Field name.
        field: &'static str,
        /// Declared type.
        kind: &'static str,
    },
}

impl BindError {
    /// Name of the field the error refers to, when there is one.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingTagMetadata { field }
            | Self::TypeConversion { field, .. }
            | Self::UnassignableField { field }
            | Self::UnsupportedFieldType { field, .. } => Some(*field),
            Self::NilTarget | Self::TargetNotStructPointer | Self::MissingValue { .. } => None,
        }
    }

    /// Env var the error refers to, when there is one.
    #[must_use]
    pub const fn env_var(&self) -> Option<&'static str> {
        match self {
            Self::MissingValue { key } | Self::TypeConversion { key, .. } => Some(*key),
            _ => None,
        }
    }

    /// True for errors an operator fixes by changing the environment, as
    /// opposed to fixing the record definition or the call.
    #[must_use]
    pub const fn is_deployment_error(&self) -> bool {
        matches!(
            self,
            Self::MissingValue { .. } | Self::TypeConversion { .. }
        )
    }

    fn error_code(&self) -> ErrorCode {
        let code = match self {
            Self::NilTarget => "nil_target",
            Self::TargetNotStructPointer => "target_not_record",
            Self::MissingTagMetadata { .. } => "missing_env_key",
            Self::MissingValue { .. } => "missing_env_value",
            Self::TypeConversion {
                target: ConversionTarget::Bool,
                ..
            } => "invalid_env_bool",
            Self::TypeConversion {
                target: ConversionTarget::Int,
                ..
            } => "invalid_env_int",
            Self::TypeConversion {
                target: ConversionTarget::List,
                ..
            } => "invalid_env_list",
            Self::UnassignableField { .. } => "unassignable_field",
            Self::UnsupportedFieldType { .. } => "unsupported_field_type",
        };
        ErrorCode::new(ERROR_NAMESPACE, code)
    }
}

impl From<BindError> for ErrorEnvelope {
    fn from(error: BindError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let mut envelope = if error.is_deployment_error() {
            Self::expected(code, message)
        } else {
            Self::invariant(code, message)
        };

        match error {
            BindError::NilTarget | BindError::TargetNotStructPointer => {},
            BindError::MissingTagMetadata { field } | BindError::UnassignableField { field } => {
                envelope = envelope.with_metadata("field", field);
            },
            BindError::MissingValue { key } => {
                envelope = envelope.with_metadata("env_var", key);
            },
            BindError::TypeConversion {
                field,
                key,
                target,
                cause,
            } => {
                envelope = envelope
                    .with_metadata("field", field)
                    .with_metadata("env_var", key)
                    .with_metadata("target", target.as_str())
                    .with_metadata("value", redact_if_secret(key, &cause.value()))
                    .with_metadata("cause", cause.to_string());
            },
            BindError::UnsupportedFieldType { field, kind } => {
                envelope = envelope
                    .with_metadata("field", field)
                    .with_metadata("kind", kind);
            },
        }

        envelope
    }
}
