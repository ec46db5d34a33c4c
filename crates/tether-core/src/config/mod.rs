mod opt;
pub use opt::{Opt, build, with_run_timeout, with_shutdown_timeout, with_value, with_values};

use std::{any::Any, collections::HashSet, fmt, sync::Arc, time::Duration};

/// Type-erased configuration payload.
///
/// Cheap to clone; the wrapped value is shared.
#[derive(Clone)]
pub struct Value(Arc<dyn Any + Send + Sync>);

impl Value {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the payload as `T`, `None` on type mismatch.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Value(..)")
    }
}

/// Configuration threaded through a service lifecycle.
///
/// Entries are append-only: setting a key that already exists adds a newer entry which shadows
/// the older one on lookup.
/// Once built the configuration is shared as `Arc<Config>` and only read.
#[derive(Clone, Debug, Default)]
pub struct Config {
    entries: Vec<(String, Value)>,
    run_timeout: Option<Duration>,
    shutdown_timeout: Option<Duration>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key = value`, shadowing any earlier entry for `key`.
    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.push((key.into(), value));
        self
    }

    pub fn set_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }

    pub fn set_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    /// Latest raw value stored under `key`.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Typed lookup.
    ///
    /// Returns `None` both when the key is absent and when the latest value under it is not a `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.value(key).and_then(Value::downcast_ref::<T>)
    }

    pub fn get_cloned<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.get::<T>(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Distinct keys in first-insertion order.
    pub fn keys(&self) -> Vec<&str> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        self.entries
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(|k| seen.insert(*k))
            .collect()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout
    }

    #[inline]
    pub fn shutdown_timeout(&self) -> Option<Duration> {
        self.shutdown_timeout
    }
}
