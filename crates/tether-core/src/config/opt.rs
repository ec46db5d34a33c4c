use std::{any::Any, fmt, time::Duration};

use tracing::trace;

use super::{Config, Value};

/// A single configuration step.
///
/// Options are applied strictly in the order they are supplied; each one receives the result of
/// all previous ones.
pub struct Opt(Box<dyn FnOnce(Config) -> Config + Send>);

impl Opt {
    /// Wrap an arbitrary configuration function.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Config) -> Config + Send + 'static,
    {
        Self(Box::new(f))
    }

    #[inline]
    fn apply(self, cfg: Config) -> Config {
        (self.0)(cfg)
    }
}

impl fmt::Debug for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Opt(..)")
    }
}

/// Fold `opts` over an empty [`Config`].
pub fn build(opts: impl IntoIterator<Item = Opt>) -> Config {
    let cfg = opts.into_iter().fold(Config::new(), |cfg, opt| opt.apply(cfg));
    trace!(
        keys = cfg.len(),
        run_timeout = ?cfg.run_timeout(),
        shutdown_timeout = ?cfg.shutdown_timeout(),
        "configuration built"
    );
    cfg
}

/// Store `value` under `key`, overwriting any earlier value.
pub fn with_value<T>(key: impl Into<String>, value: T) -> Opt
where
    T: Any + Send + Sync,
{
    let key = key.into();
    Opt::new(move |cfg| cfg.set(key, Value::new(value)))
}

/// Merge a batch of values.
///
/// Entries are applied in the iteration order of `values`, so a duplicate key resolves to the
/// last one yielded.
pub fn with_values<K, I>(values: I) -> Opt
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    let values: Vec<(String, Value)> = values.into_iter().map(|(k, v)| (k.into(), v)).collect();
    Opt::new(move |cfg| values.into_iter().fold(cfg, |cfg, (k, v)| cfg.set(k, v)))
}

/// Force shutdown once `run` has been going for `timeout`.
pub fn with_run_timeout(timeout: Duration) -> Opt {
    Opt::new(move |cfg| cfg.set_run_timeout(timeout))
}

/// Advisory deadline handed to `Service::shutdown`.
pub fn with_shutdown_timeout(timeout: Duration) -> Opt {
    Opt::new(move |cfg| cfg.set_shutdown_timeout(timeout))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn build_without_options_is_empty() {
        let cfg = build(Vec::<Opt>::new());
        assert!(cfg.is_empty());
        assert!(cfg.run_timeout().is_none());
    }

    #[test]
    fn later_option_wins_for_same_key() {
        let cfg = build([with_value("port", 8080_u16), with_value("port", 9090_u16)]);
        assert_eq!(cfg.get::<u16>("port"), Some(&9090));
    }

    #[test]
    fn batch_is_merged_in_iteration_order() {
        let cfg = build([with_values(vec![
            ("host", Value::new("localhost")),
            ("port", Value::new(1_u16)),
            ("port", Value::new(2_u16)),
        ])]);

        assert_eq!(cfg.get::<&str>("host"), Some(&"localhost"));
        assert_eq!(cfg.get::<u16>("port"), Some(&2));
    }

    #[test]
    fn batch_from_ordered_map() {
        let mut values = BTreeMap::new();
        values.insert("a", Value::new(1_i64));
        values.insert("b", Value::new(2_i64));

        let cfg = build([with_value("a", 0_i64), with_values(values)]);
        assert_eq!(cfg.get::<i64>("a"), Some(&1));
        assert_eq!(cfg.get::<i64>("b"), Some(&2));
    }

    #[test]
    fn single_value_after_batch_overrides_batch() {
        let cfg = build([
            with_values([("mode", Value::new("batch"))]),
            with_value("mode", "single"),
        ]);
        assert_eq!(cfg.get::<&str>("mode"), Some(&"single"));
    }

    #[test]
    fn timeouts_are_recorded_and_overridable() {
        let cfg = build([
            with_run_timeout(Duration::from_secs(5)),
            with_shutdown_timeout(Duration::from_millis(500)),
            with_run_timeout(Duration::from_secs(1)),
        ]);
        assert_eq!(cfg.run_timeout(), Some(Duration::from_secs(1)));
        assert_eq!(cfg.shutdown_timeout(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn custom_option_sees_previous_steps() {
        let cfg = build([
            with_value("base", 40_u32),
            Opt::new(|cfg| {
                let base = cfg.get_cloned::<u32>("base").unwrap_or_default();
                cfg.set("derived", Value::new(base + 2))
            }),
        ]);
        assert_eq!(cfg.get::<u32>("derived"), Some(&42));
    }
}
