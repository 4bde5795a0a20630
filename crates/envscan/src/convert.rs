//! String-to-field conversion.
//!
//! Conversion never echoes the raw value in its `Display` output; the value is
//! kept on the error for callers that redact it first.

use crate::record::{IntSlot, IntWidth};
use std::fmt;
use std::num::ParseIntError;

/// Conversion family reported by a failed parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionTarget {
    /// Boolean literal.
    Bool,
    /// Base-10 signed integer.
    Int,
    /// Fixed-length comma-separated list.
    List,
}

impl ConversionTarget {
    /// Short label (`bool`, `int` or `list`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::List => "list",
        }
    }
}

impl fmt::Display for ConversionTarget {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Why a value could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Not one of `true/false/t/f/1/0` (any case).
    #[error("invalid boolean literal")]
    InvalidBool {
        /// Raw input value.
        value: String,
    },
    /// Not a base-10 integer representable as `i64`.
    #[error("invalid base-10 integer")]
    InvalidInt {
        /// Raw input value.
        value: String,
        /// Underlying parse failure.
        source: ParseIntError,
    },
    /// Parsed, but outside the field's width.
    #[error("integer does not fit in {width}")]
    IntOutOfRange {
        /// Parsed value.
        value: i64,
        /// Width of the target field.
        width: IntWidth,
    },
    /// Split into a different number of parts than the array holds.
    #[error("expected {expected} comma-separated parts, found {found}")]
    PartCount {
        /// Raw input value.
        value: String,
        /// Array length.
        expected: usize,
        /// Parts in the input.
        found: usize,
    },
}

impl ConversionError {
    /// The offending input, as text.
    #[must_use]
    pub fn value(&self) -> String {
        match self {
            Self::InvalidBool { value }
            | Self::InvalidInt { value, .. }
            | Self::PartCount { value, .. } => value.clone(),
            Self::IntOutOfRange { value, .. } => value.to_string(),
        }
    }
}

/// Parse a boolean literal: `true/false/t/f/1/0`, case-insensitive.
pub fn parse_bool(value: &str) -> Result<bool, ConversionError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        _ => Err(ConversionError::InvalidBool {
            value: value.to_string(),
        }),
    }
}

/// Parse a base-10 signed integer into `i64`.
///
/// An optional leading sign is accepted; whitespace is not.
pub fn parse_int(value: &str) -> Result<i64, ConversionError> {
    value
        .parse::<i64>()
        .map_err(|source| ConversionError::InvalidInt {
            value: value.to_string(),
            source,
        })
}

/// Narrow `value` into the slot's width and store it.
///
/// The slot is untouched when the value does not fit.
pub fn assign_int(slot: IntSlot<'_>, value: i64) -> Result<(), ConversionError> {
    let width = slot.width();
    let out_of_range = |_| ConversionError::IntOutOfRange { value, width };
    match slot {
        IntSlot::I8(field) => *field = i8::try_from(value).map_err(out_of_range)?,
        IntSlot::I16(field) => *field = i16::try_from(value).map_err(out_of_range)?,
        IntSlot::I32(field) => *field = i32::try_from(value).map_err(out_of_range)?,
        IntSlot::I64(field) => *field = value,
        IntSlot::I128(field) => *field = i128::from(value),
        IntSlot::Isize(field) => *field = isize::try_from(value).map_err(out_of_range)?,
    }
    Ok(())
}

/// Split on `,` with no trimming or escaping; `""` yields `[""]`.
pub fn split_csv(value: &str) -> Vec<String> {
    value.split(',').map(str::to_owned).collect()
}

/// Split on `,` into a fixed-length array.
///
/// The slot is untouched unless the part count matches its length.
pub fn assign_str_array(slot: &mut [String], value: &str) -> Result<(), ConversionError> {
    let parts = split_csv(value);
    if parts.len() != slot.len() {
        return Err(ConversionError::PartCount {
            value: value.to_string(),
            expected: slot.len(),
            found: parts.len(),
        });
    }
    for (storage, part) in slot.iter_mut().zip(parts) {
        *storage = part;
    }
    Ok(())
}
