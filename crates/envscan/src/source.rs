//! Environment lookup sources.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Lookup-by-name access to environment values.
///
/// `None` and `Some("")` both mean "not set".
pub trait EnvSource {
    /// Value for `key`, if any.
    fn lookup(&self, key: &str) -> Option<String>;
}

/// The live process environment.
///
/// Values that are not valid Unicode are treated as unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<H: BuildHasher> EnvSource for HashMap<String, String, H> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<S: EnvSource + ?Sized> EnvSource for &S {
    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }
}
