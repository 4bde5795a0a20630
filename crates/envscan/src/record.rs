//! Record model: field tables, typed slots, and bind targets.
//!
//! A record exposes its fields twice:
//! - [`EnvRecord::fields`] is a static table (name, env key, declared kind)
//! - [`EnvRecord::slot`] hands out a typed `&mut` into one field's storage
//!
//! Both are normally generated by `#[derive(EnvRecord)]`.

use std::fmt;

/// Signed integer widths a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    /// `i8`.
    I8,
    /// `i16`.
    I16,
    /// `i32`.
    I32,
    /// `i64`.
    I64,
    /// `i128`.
    I128,
    /// `isize`.
    Isize,
}

impl IntWidth {
    /// Rust type name for this width.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::I128 => "i128",
            Self::Isize => "isize",
        }
    }
}

impl fmt::Display for IntWidth {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Declared type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// `String`, assigned verbatim.
    Str,
    /// `bool`.
    Bool,
    /// Signed integer of the given width.
    Int(IntWidth),
    /// `Vec<String>`, split on commas.
    StrSeq,
    /// `[String; N]`, split on commas into exactly `N` parts; carries the
    /// type as written.
    StrArray(&'static str),
    /// Any other type; carries the type as written in the record.
    Unsupported(&'static str),
}

impl FieldKind {
    /// Type label used in descriptions and errors.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Str => "String",
            Self::Bool => "bool",
            Self::Int(width) => width.as_str(),
            Self::StrSeq => "Vec<String>",
            Self::StrArray(label) | Self::Unsupported(label) => label,
        }
    }
}

/// One entry of a record's field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    /// Field name as declared.
    pub name: &'static str,
    /// Env var name; `None` when the field carries no key.
    pub key: Option<&'static str>,
    /// Declared field type.
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Build a descriptor (usable in `static` tables).
    #[must_use]
    pub const fn new(name: &'static str, key: Option<&'static str>, kind: FieldKind) -> Self {
        Self { name, key, kind }
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key {
            Some(key) if !key.is_empty() => {
                write!(formatter, "{}: {} <- {key}", self.name, self.kind.label())
            },
            _ => write!(
                formatter,
                "{}: {} <- (no env key)",
                self.name,
                self.kind.label()
            ),
        }
    }
}

/// Mutable handle to an integer field.
#[derive(Debug)]
pub enum IntSlot<'a> {
    /// `i8` storage.
    I8(&'a mut i8),
    /// `i16` storage.
    I16(&'a mut i16),
    /// `i32` storage.
    I32(&'a mut i32),
    /// `i64` storage.
    I64(&'a mut i64),
    /// `i128` storage.
    I128(&'a mut i128),
    /// `isize` storage.
    Isize(&'a mut isize),
}

impl IntSlot<'_> {
    /// Width of the underlying storage.
    #[must_use]
    pub const fn width(&self) -> IntWidth {
        match self {
            Self::I8(_) => IntWidth::I8,
            Self::I16(_) => IntWidth::I16,
            Self::I32(_) => IntWidth::I32,
            Self::I64(_) => IntWidth::I64,
            Self::I128(_) => IntWidth::I128,
            Self::Isize(_) => IntWidth::Isize,
        }
    }
}

/// Mutable handle to one field's storage.
#[derive(Debug)]
pub enum FieldSlot<'a> {
    /// String storage.
    Str(&'a mut String),
    /// Boolean storage.
    Bool(&'a mut bool),
    /// Integer storage.
    Int(IntSlot<'a>),
    /// String sequence storage.
    StrSeq(&'a mut Vec<String>),
    /// Fixed-length string array storage.
    StrArray(&'a mut [String]),
    /// The field exists but its type cannot be bound.
    Unsupported,
}

/// A struct whose fields can be populated from the environment.
///
/// `fields` and `slot` must agree: `slot(i)` addresses the field described by
/// `fields()[i]`. Returning `None` from `slot` marks the field as not
/// assignable.
pub trait EnvRecord {
    /// Field table in declaration order.
    fn fields(&self) -> &'static [FieldDescriptor];

    /// Mutable handle to the field at `index`.
    fn slot(&mut self, index: usize) -> Option<FieldSlot<'_>>;
}

/// Anything a caller may hand to the binder.
///
/// Records resolve to themselves; wrappers unwrap to the record they hold;
/// plain values resolve to `None` and are rejected.
pub trait EnvTarget {
    /// The record behind this target, if any.
    fn as_record(&mut self) -> Option<&mut dyn EnvRecord>;
}

impl<T: EnvTarget> EnvTarget for Option<T> {
    fn as_record(&mut self) -> Option<&mut dyn EnvRecord> {
        self.as_mut().and_then(EnvTarget::as_record)
    }
}

impl<T: EnvTarget + ?Sized> EnvTarget for Box<T> {
    fn as_record(&mut self) -> Option<&mut dyn EnvRecord> {
        (**self).as_record()
    }
}

macro_rules! impl_non_record_target {
    ($($ty:ty),* $(,)?) => {
        $(
            impl EnvTarget for $ty {
                fn as_record(&mut self) -> Option<&mut dyn EnvRecord> {
                    None
                }
            }
        )*
    };
}

impl_non_record_target!(
    (),
    bool,
    char,
    str,
    String,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    Vec<String>,
);

/// Render a record's field table, one `name: type <- KEY` line per field.
pub fn describe_record(record: &dyn EnvRecord) -> String {
    record
        .fields()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
