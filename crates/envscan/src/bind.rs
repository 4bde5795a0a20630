//! The environment binder.
//!
//! Fields are bound in declaration order and the first failure aborts the
//! call. Fields written before the failing one stay written; later fields keep
//! their previous values.

use crate::convert::{
    ConversionTarget, assign_int, assign_str_array, parse_bool, parse_int, split_csv,
};
use crate::error::BindError;
use crate::record::{EnvRecord, EnvTarget, FieldDescriptor, FieldSlot};
use crate::source::{EnvSource, ProcessEnv};
use std::collections::BTreeMap;

/// Default values keyed by env var name.
pub type Fallbacks = BTreeMap<String, String>;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueOrigin {
    Environment,
    Fallback,
}

impl ValueOrigin {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Environment => "env",
            Self::Fallback => "fallback",
        }
    }
}

/// Bind `target` from the live process environment.
///
/// # Examples
///
/// ```
/// use envscan::{BindError, EnvRecord, Fallbacks, read_environment};
///
/// #[derive(Debug, Default, EnvRecord)]
/// struct Config {
///     #[env(key = "ENVSCAN_DOC_PORT")]
///     port: i32,
///     #[env(key = "ENVSCAN_DOC_FEATURES")]
///     features: Vec<String>,
/// }
///
/// let mut fallbacks = Fallbacks::new();
/// fallbacks.insert("ENVSCAN_DOC_PORT".into(), "8080".into());
/// fallbacks.insert("ENVSCAN_DOC_FEATURES".into(), "create,test".into());
///
/// let mut config = Config::default();
/// read_environment(Some(&mut config), &fallbacks)?;
/// assert_eq!(config.port, 8080);
/// assert_eq!(config.features, ["create", "test"]);
/// # Ok::<(), BindError>(())
/// ```
pub fn read_environment<T>(target: Option<&mut T>, fallbacks: &Fallbacks) -> Result<(), BindError>
where
    T: EnvTarget + ?Sized,
{
    bind(&ProcessEnv, target, fallbacks)
}

/// Bind `target` from `source`, falling back to `fallbacks` for keys the
/// source leaves unset or empty.
pub fn bind<S, T>(
    source: &S,
    target: Option<&mut T>,
    fallbacks: &Fallbacks,
) -> Result<(), BindError>
where
    S: EnvSource + ?Sized,
    T: EnvTarget + ?Sized,
{
    let Some(target) = target else {
        return Err(BindError::NilTarget);
    };
    let Some(record) = target.as_record() else {
        return Err(BindError::TargetNotStructPointer);
    };
    bind_record(source, record, fallbacks)
}

fn bind_record<S>(
    source: &S,
    record: &mut dyn EnvRecord,
    fallbacks: &Fallbacks,
) -> Result<(), BindError>
where
    S: EnvSource + ?Sized,
{
    let fields = record.fields();
    tracing::debug!(fields = fields.len(), "binding record from environment");
    for (index, descriptor) in fields.iter().enumerate() {
        bind_field(source, record, index, descriptor, fallbacks).inspect_err(|error| {
            tracing::debug!(field = descriptor.name, %error, "binding aborted");
        })?;
    }
    Ok(())
}

fn bind_field<S>(
    source: &S,
    record: &mut dyn EnvRecord,
    index: usize,
    descriptor: &FieldDescriptor,
    fallbacks: &Fallbacks,
) -> Result<(), BindError>
where
    S: EnvSource + ?Sized,
{
    let field = descriptor.name;
    let key = descriptor
        .key
        .filter(|key| !key.is_empty())
        .ok_or(BindError::MissingTagMetadata { field })?;
    let (value, origin) =
        resolve(source, key, fallbacks).ok_or(BindError::MissingValue { key })?;
    let slot = record
        .slot(index)
        .ok_or(BindError::UnassignableField { field })?;

    assign(slot, descriptor, key, &value)?;
    tracing::debug!(field, env_var = key, origin = origin.as_str(), "bound field");
    Ok(())
}

fn resolve<S>(source: &S, key: &str, fallbacks: &Fallbacks) -> Option<(String, ValueOrigin)>
where
    S: EnvSource + ?Sized,
{
    if let Some(value) = source.lookup(key).filter(|value| !value.is_empty()) {
        return Some((value, ValueOrigin::Environment));
    }
    fallbacks
        .get(key)
        .filter(|value| !value.is_empty())
        .map(|value| (value.clone(), ValueOrigin::Fallback))
}

fn assign(
    slot: FieldSlot<'_>,
    descriptor: &FieldDescriptor,
    key: &'static str,
    value: &str,
) -> Result<(), BindError> {
    let field = descriptor.name;
    let conversion = move |target| {
        move |cause| BindError::TypeConversion {
            field,
            key,
            target,
            cause,
        }
    };
    match slot {
        FieldSlot::Str(storage) => value.clone_into(storage),
        FieldSlot::Bool(storage) => {
            *storage = parse_bool(value).map_err(conversion(ConversionTarget::Bool))?;
        },
        FieldSlot::Int(storage) => {
            let parsed = parse_int(value).map_err(conversion(ConversionTarget::Int))?;
            assign_int(storage, parsed).map_err(conversion(ConversionTarget::Int))?;
        },
        FieldSlot::StrSeq(storage) => *storage = split_csv(value),
        FieldSlot::StrArray(storage) => {
            assign_str_array(storage, value).map_err(conversion(ConversionTarget::List))?;
        },
        FieldSlot::Unsupported => {
            return Err(BindError::UnsupportedFieldType {
                field,
                kind: descriptor.kind.label(),
            });
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ConversionError;
    use crate::record::{FieldKind, IntWidth};
    use std::error::Error;

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[derive(Debug, Default, Clone, PartialEq, Eq, envscan::EnvRecord)]
    struct MockConfig {
        #[env(key = "MOCK_STRING")]
        mock_string: String,
        #[env(key = "MOCK_SLICE_STRING")]
        mock_slice_string: Vec<String>,
    }

    #[derive(Debug, Default, Clone, PartialEq, Eq, envscan::EnvRecord)]
    struct ServerConfig {
        #[env(key = "APP_HOST")]
        host: String,
        #[env(key = "APP_PORT")]
        port: i32,
        #[env(key = "APP_DEBUG")]
        debug: bool,
        #[env(key = "APP_FEATURES")]
        features: Vec<String>,
    }

    #[test]
    fn binds_env_and_fallback_values() -> Result<(), Box<dyn Error>> {
        let source = env(&[("MOCK_STRING", "yupi")]);
        let fallbacks = env(&[("MOCK_SLICE_STRING", "create,test")]);
        let mut config = MockConfig::default();

        bind(&source, Some(&mut config), &fallbacks)?;

        assert_eq!(config.mock_string, "yupi");
        assert_eq!(config.mock_slice_string, vec!["create", "test"]);
        Ok(())
    }

    #[test]
    fn binds_every_supported_kind() -> Result<(), Box<dyn Error>> {
        let source = env(&[
            ("APP_HOST", " example.org "),
            ("APP_PORT", "-8080"),
            ("APP_DEBUG", "T"),
            ("APP_FEATURES", "solo"),
        ]);
        let mut config = ServerConfig::default();

        bind(&source, Some(&mut config), &Fallbacks::new())?;

        assert_eq!(
            config,
            ServerConfig {
                host: " example.org ".to_string(),
                port: -8080,
                debug: true,
                features: vec!["solo".to_string()],
            }
        );
        Ok(())
    }

    #[test]
    fn live_value_wins_over_fallback() -> Result<(), Box<dyn Error>> {
        let source = env(&[("MOCK_STRING", "live"), ("MOCK_SLICE_STRING", "a")]);
        let fallbacks = env(&[("MOCK_STRING", "default"), ("MOCK_SLICE_STRING", "b,c")]);
        let mut config = MockConfig::default();

        bind(&source, Some(&mut config), &fallbacks)?;

        assert_eq!(config.mock_string, "live");
        assert_eq!(config.mock_slice_string, vec!["a"]);
        Ok(())
    }

    #[test]
    fn empty_live_value_falls_through_to_fallback() -> Result<(), Box<dyn Error>> {
        let source = env(&[("MOCK_STRING", ""), ("MOCK_SLICE_STRING", "x")]);
        let fallbacks = env(&[("MOCK_STRING", "default")]);
        let mut config = MockConfig::default();

        bind(&source, Some(&mut config), &fallbacks)?;

        assert_eq!(config.mock_string, "default");
        Ok(())
    }

    #[test]
    fn missing_everywhere_reports_the_key() {
        let fallbacks = env(&[("MOCK_STRING", "set"), ("MOCK_SLICE_STRING", "")]);
        let mut config = MockConfig::default();

        let error = bind(&Fallbacks::new(), Some(&mut config), &fallbacks).err();

        assert_eq!(
            error,
            Some(BindError::MissingValue {
                key: "MOCK_SLICE_STRING"
            })
        );
        assert_eq!(config.mock_string, "set");
    }

    #[test]
    fn nil_target_is_rejected() {
        let error = bind(&Fallbacks::new(), None::<&mut MockConfig>, &Fallbacks::new()).err();
        assert_eq!(error, Some(BindError::NilTarget));

        let error = read_environment(None::<&mut dyn EnvTarget>, &Fallbacks::new()).err();
        assert_eq!(error, Some(BindError::NilTarget));
    }

    #[test]
    fn non_record_targets_are_rejected() {
        let source = env(&[("MOCK_STRING", "yupi")]);

        let mut plain = String::new();
        let error = bind(&source, Some(&mut plain), &Fallbacks::new()).err();
        assert_eq!(error, Some(BindError::TargetNotStructPointer));

        let mut number = 7_i64;
        let error = bind(&source, Some(&mut number), &Fallbacks::new()).err();
        assert_eq!(error, Some(BindError::TargetNotStructPointer));

        let mut empty: Option<MockConfig> = None;
        let error = bind(&source, Some(&mut empty), &Fallbacks::new()).err();
        assert_eq!(error, Some(BindError::TargetNotStructPointer));
    }

    #[test]
    fn wrapped_records_are_bound_in_place() -> Result<(), Box<dyn Error>> {
        let source = env(&[("MOCK_STRING", "boxed"), ("MOCK_SLICE_STRING", "one")]);

        let mut boxed: Box<dyn EnvTarget> = Box::new(MockConfig::default());
        bind(&source, Some(boxed.as_mut()), &Fallbacks::new())?;

        let mut present = Some(MockConfig::default());
        bind(&source, Some(&mut present), &Fallbacks::new())?;
        assert_eq!(
            present.map(|config| config.mock_string).as_deref(),
            Some("boxed")
        );
        Ok(())
    }

    #[derive(Debug, Default, envscan::EnvRecord)]
    struct HalfTagged {
        #[env(key = "HALF_FIRST")]
        first: String,
        second: String,
        #[env(key = "HALF_THIRD")]
        third: String,
    }

    #[test]
    fn untagged_field_fails_fast_and_keeps_earlier_writes() {
        let source = env(&[("HALF_FIRST", "one"), ("HALF_THIRD", "three")]);
        let mut record = HalfTagged::default();

        let error = bind(&source, Some(&mut record), &Fallbacks::new()).err();

        assert_eq!(
            error,
            Some(BindError::MissingTagMetadata { field: "second" })
        );
        assert_eq!(record.first, "one");
        assert!(record.second.is_empty());
        assert!(record.third.is_empty());
    }

    #[derive(Debug, Default, envscan::EnvRecord)]
    struct EmptyKey {
        #[env(key = "")]
        value: String,
    }

    #[test]
    fn empty_key_counts_as_missing_metadata() {
        let mut record = EmptyKey::default();
        let error = bind(&Fallbacks::new(), Some(&mut record), &Fallbacks::new()).err();
        assert_eq!(error, Some(BindError::MissingTagMetadata { field: "value" }));
    }

    #[test]
    fn malformed_bool_is_a_conversion_error() {
        let source = env(&[
            ("APP_HOST", "h"),
            ("APP_PORT", "1"),
            ("APP_DEBUG", "not-a-bool"),
            ("APP_FEATURES", "f"),
        ]);
        let mut config = ServerConfig::default();

        let error = bind(&source, Some(&mut config), &Fallbacks::new()).err();

        assert_eq!(
            error,
            Some(BindError::TypeConversion {
                field: "debug",
                key: "APP_DEBUG",
                target: ConversionTarget::Bool,
                cause: ConversionError::InvalidBool {
                    value: "not-a-bool".to_string()
                },
            })
        );
        assert_eq!(config.port, 1);
        assert!(config.features.is_empty());
    }

    #[test]
    fn malformed_int_is_a_conversion_error() {
        let source = env(&[("APP_HOST", "h"), ("APP_PORT", "80a")]);
        let mut config = ServerConfig::default();

        let error = bind(&source, Some(&mut config), &Fallbacks::new()).err();

        assert!(matches!(
            error,
            Some(BindError::TypeConversion {
                field: "port",
                target: ConversionTarget::Int,
                cause: ConversionError::InvalidInt { .. },
                ..
            })
        ));
    }

    #[test]
    fn out_of_range_int_leaves_field_untouched() {
        let source = env(&[("APP_HOST", "h"), ("APP_PORT", "4294967296")]);
        let mut config = ServerConfig {
            port: 99,
            ..ServerConfig::default()
        };

        let error = bind(&source, Some(&mut config), &Fallbacks::new()).err();

        assert!(matches!(
            error,
            Some(BindError::TypeConversion {
                cause: ConversionError::IntOutOfRange {
                    width: IntWidth::I32,
                    ..
                },
                ..
            })
        ));
        assert_eq!(config.port, 99);
    }

    #[derive(Debug, Default, envscan::EnvRecord)]
    struct WithBytes {
        #[env(key = "BYTES_NAME")]
        name: String,
        #[env(key = "BYTES_PAYLOAD")]
        payload: Vec<u8>,
    }

    #[test]
    fn unsupported_type_is_reported_after_value_lookup() {
        let mut record = WithBytes::default();
        let source = env(&[("BYTES_NAME", "n")]);
        let error = bind(&source, Some(&mut record), &Fallbacks::new()).err();
        assert_eq!(
            error,
            Some(BindError::MissingValue {
                key: "BYTES_PAYLOAD"
            })
        );

        let source = env(&[("BYTES_NAME", "n"), ("BYTES_PAYLOAD", "1,2")]);
        let error = bind(&source, Some(&mut record), &Fallbacks::new()).err();
        assert_eq!(
            error,
            Some(BindError::UnsupportedFieldType {
                field: "payload",
                kind: "Vec<u8>"
            })
        );
        assert!(record.payload.is_empty());
    }

    struct Sealed {
        token: String,
    }

    impl EnvRecord for Sealed {
        fn fields(&self) -> &'static [FieldDescriptor] {
            static FIELDS: &[FieldDescriptor] = &[FieldDescriptor::new(
                "token",
                Some("SEALED_TOKEN"),
                FieldKind::Str,
            )];
            FIELDS
        }

        fn slot(&mut self, _index: usize) -> Option<FieldSlot<'_>> {
            None
        }
    }

    impl EnvTarget for Sealed {
        fn as_record(&mut self) -> Option<&mut dyn EnvRecord> {
            Some(self)
        }
    }

    #[test]
    fn record_without_storage_is_unassignable() {
        let source = env(&[("SEALED_TOKEN", "abc")]);
        let mut sealed = Sealed {
            token: String::new(),
        };

        let error = bind(&source, Some(&mut sealed), &Fallbacks::new()).err();

        assert_eq!(error, Some(BindError::UnassignableField { field: "token" }));
        assert!(sealed.token.is_empty());
    }

    #[derive(Debug, Default, envscan::EnvRecord)]
    struct Endpoints {
        #[env(key = "ENDPOINT_PAIR")]
        pair: [String; 2],
    }

    #[test]
    fn fixed_arrays_take_exactly_their_length() -> Result<(), Box<dyn Error>> {
        let mut endpoints = Endpoints::default();
        let source = env(&[("ENDPOINT_PAIR", "primary,replica")]);
        bind(&source, Some(&mut endpoints), &Fallbacks::new())?;
        assert_eq!(endpoints.pair, ["primary", "replica"]);

        let source = env(&[("ENDPOINT_PAIR", "only")]);
        let error = bind(&source, Some(&mut endpoints), &Fallbacks::new()).err();
        assert_eq!(
            error,
            Some(BindError::TypeConversion {
                field: "pair",
                key: "ENDPOINT_PAIR",
                target: ConversionTarget::List,
                cause: ConversionError::PartCount {
                    value: "only".to_string(),
                    expected: 2,
                    found: 1,
                },
            })
        );
        assert_eq!(endpoints.pair, ["primary", "replica"]);
        Ok(())
    }

    #[test]
    fn repeated_binds_on_fresh_records_agree() -> Result<(), Box<dyn Error>> {
        let source = env(&[("APP_HOST", "h"), ("APP_DEBUG", "0")]);
        let fallbacks = env(&[("APP_PORT", "443"), ("APP_FEATURES", "a,b")]);

        let mut first = ServerConfig::default();
        let mut second = ServerConfig::default();
        bind(&source, Some(&mut first), &fallbacks)?;
        bind(&source, Some(&mut second), &fallbacks)?;

        assert_eq!(first, second);
        Ok(())
    }
}
