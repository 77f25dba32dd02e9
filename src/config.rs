use crate::error::Error;
use crate::hash::BucketKey;
use crate::value::MapValue;

/// Largest accepted bucket count.
pub const MAX_BUCKETS: u32 = 100_000_000;
/// Bucket count used when none is configured.
pub const DEFAULT_BUCKETS: u32 = 8;
/// Per-bucket starting capacity used when none is configured.
pub const DEFAULT_INITIAL_CAPACITY: usize = 100_000;
/// Load factor used when none is configured.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.8;

// hashbrown grows once a table is 7/8 full.
const TABLE_MAX_LOAD: f64 = 0.875;

/// How bucket locks are acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    /// Park the thread until the lock is free. Lowest CPU use under
    /// contention, longer latency tail.
    Blocking,
    /// Spin on try-lock with a CPU spin hint. Lower latency under light or
    /// moderate contention, burns CPU while waiting.
    #[default]
    BusyWaiting,
}

/// Configuration for a ShardedMap instance.
///
/// Setters only record values. Everything is checked by [`Config::validate`],
/// which `build()` and [`ShardedMap::with_config`](crate::ShardedMap::with_config)
/// call before allocating.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub(crate) buckets: u32,
    pub(crate) initial_capacity: usize,
    pub(crate) load_factor: f32,
    pub(crate) mode: LockMode,
}

impl Config {
    /// Create a new config with defaults (8 buckets, 100 000 entries per
    /// bucket, load factor 0.8, busy-waiting).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of buckets. Must be in `[1, MAX_BUCKETS]`.
    pub fn buckets(mut self, count: u32) -> Self {
        self.buckets = count;
        self
    }

    /// Set the number of entries each bucket can hold before its table grows.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the load factor. Must be finite and in `(0, 1]`.
    ///
    /// Tables grow once they are 7/8 full regardless of this setting, so the
    /// factor only scales the initial reservation. Values at or above 0.875
    /// reserve exactly `initial_capacity` slots.
    pub fn load_factor(mut self, factor: f32) -> Self {
        self.load_factor = factor;
        self
    }

    /// Set the lock acquisition mode.
    pub fn mode(mut self, mode: LockMode) -> Self {
        self.mode = mode;
        self
    }

    /// Check the configured values.
    pub fn validate(&self) -> Result<(), Error> {
        if self.buckets == 0 || self.buckets > MAX_BUCKETS {
            return Err(Error::InvalidBucketCount(self.buckets));
        }
        if !self.load_factor.is_finite() || self.load_factor <= 0.0 || self.load_factor > 1.0 {
            return Err(Error::InvalidLoadFactor(self.load_factor));
        }
        self.table_capacity()?;
        Ok(())
    }

    /// Slots to reserve in each bucket's table.
    ///
    /// A load factor below the table's own maximum load reserves
    /// proportionally more room; the result is never below
    /// `initial_capacity`. Fails when the scaled size does not fit an
    /// allocation.
    pub(crate) fn table_capacity(&self) -> Result<usize, Error> {
        let scaled =
            (self.initial_capacity as f64 * TABLE_MAX_LOAD / self.load_factor as f64).ceil();
        if !scaled.is_finite() || scaled > isize::MAX as f64 {
            return Err(Error::CapacityOverflow(self.initial_capacity));
        }
        Ok((scaled as usize).max(self.initial_capacity))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buckets: DEFAULT_BUCKETS,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            mode: LockMode::default(),
        }
    }
}

/// Builder for creating a ShardedMap with custom configuration.
///
/// ```rust
/// use primshard::{LockMode, ShardedMapBuilder};
///
/// let map = ShardedMapBuilder::new()
///     .buckets(16)
///     .initial_capacity(1_024)
///     .mode(LockMode::Blocking)
///     .default_value(-1i64)
///     .build::<i64>()?;
///
/// assert_eq!(map.get(&42), -1);
/// # Ok::<(), primshard::Error>(())
/// ```
pub struct ShardedMapBuilder<V> {
    config: Config,
    default_value: Option<V>,
}

impl<V> ShardedMapBuilder<V> {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            default_value: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the number of buckets. Checked in [`build`](Self::build).
    pub fn buckets(mut self, count: u32) -> Self {
        self.config = self.config.buckets(count);
        self
    }

    /// Set the starting capacity of each bucket's table.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config = self.config.initial_capacity(capacity);
        self
    }

    /// Set the load factor. Checked in [`build`](Self::build).
    pub fn load_factor(mut self, factor: f32) -> Self {
        self.config = self.config.load_factor(factor);
        self
    }

    /// Set the lock acquisition mode.
    pub fn mode(mut self, mode: LockMode) -> Self {
        self.config = self.config.mode(mode);
        self
    }

    /// Set the value returned for absent keys. Defaults to `V::default()`.
    pub fn default_value(mut self, value: V) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Build a ShardedMap with the configured settings.
    ///
    /// Value types without a `Default` impl go through
    /// [`build_with_default`](Self::build_with_default) instead.
    pub fn build<K>(self) -> Result<crate::ShardedMap<K, V>, Error>
    where
        K: BucketKey + Send + Sync,
        V: MapValue + Default + Send + Sync,
    {
        let default_value = self.default_value.unwrap_or_default();
        crate::ShardedMap::with_config(self.config, default_value)
    }

    /// Build a ShardedMap that returns `default_value` for absent keys,
    /// ignoring any value passed to [`default_value`](Self::default_value).
    pub fn build_with_default<K>(self, default_value: V) -> Result<crate::ShardedMap<K, V>, Error>
    where
        K: BucketKey + Send + Sync,
        V: MapValue + Send + Sync,
    {
        crate::ShardedMap::with_config(self.config, default_value)
    }
}

impl<V> Default for ShardedMapBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.buckets, 8);
        assert_eq!(config.initial_capacity, 100_000);
        assert_eq!(config.load_factor, 0.8);
        assert_eq!(config.mode, LockMode::BusyWaiting);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bucket_bounds() {
        assert_eq!(
            Config::new().buckets(0).validate(),
            Err(Error::InvalidBucketCount(0))
        );
        assert_eq!(
            Config::new().buckets(MAX_BUCKETS + 1).validate(),
            Err(Error::InvalidBucketCount(MAX_BUCKETS + 1))
        );
        assert!(Config::new().buckets(1).validate().is_ok());
        assert!(Config::new().buckets(MAX_BUCKETS).validate().is_ok());
    }

    #[test]
    fn test_load_factor_bounds() {
        for bad in [0.0, -0.5, 1.01, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                Config::new().load_factor(bad).validate(),
                Err(Error::InvalidLoadFactor(_))
            ));
        }
        assert!(Config::new().load_factor(1.0).validate().is_ok());
        assert!(Config::new().load_factor(0.01).validate().is_ok());
    }

    #[test]
    fn test_unreservable_capacity_is_rejected() {
        let tiny_factor = Config::new()
            .buckets(1)
            .initial_capacity(16)
            .load_factor(f32::MIN_POSITIVE);
        assert_eq!(tiny_factor.validate(), Err(Error::CapacityOverflow(16)));

        let huge = Config::new().initial_capacity(usize::MAX);
        assert_eq!(huge.validate(), Err(Error::CapacityOverflow(usize::MAX)));
    }

    #[test]
    fn test_build_reports_capacity_overflow() {
        let result = ShardedMapBuilder::<i32>::new()
            .buckets(1)
            .initial_capacity(16)
            .load_factor(f32::MIN_POSITIVE)
            .build::<i32>();
        assert!(matches!(result, Err(Error::CapacityOverflow(16))));

        // Passes the size check but overflows the table's own slot math.
        let result = ShardedMapBuilder::<i32>::new()
            .buckets(1)
            .initial_capacity(usize::MAX / 4)
            .build::<i32>();
        assert!(matches!(result, Err(Error::CapacityOverflow(_))));
    }

    #[test]
    fn test_build_with_default_needs_no_default_impl() {
        #[derive(Clone, Debug, PartialEq)]
        struct Missing(&'static str);

        impl MapValue for Missing {
            fn same_value(&self, other: &Self) -> bool {
                self == other
            }
        }

        let map = ShardedMapBuilder::new()
            .buckets(2)
            .initial_capacity(8)
            .build_with_default::<i64>(Missing("none"))
            .unwrap();
        assert_eq!(map.get(&1), Missing("none"));
        assert_eq!(map.put(1, Missing("one")), Missing("none"));
        assert_eq!(map.get(&1), Missing("one"));
    }

    #[test]
    fn test_table_capacity() {
        let config = Config::new().initial_capacity(800).load_factor(0.875);
        assert_eq!(config.table_capacity(), Ok(800));

        let config = Config::new().initial_capacity(800).load_factor(0.4375);
        assert_eq!(config.table_capacity(), Ok(1600));

        // Looser than the table's own maximum never shrinks the reservation.
        let config = Config::new().initial_capacity(800).load_factor(1.0);
        assert_eq!(config.table_capacity(), Ok(800));
        let config = Config::new().initial_capacity(800).load_factor(0.9);
        assert_eq!(config.table_capacity(), Ok(800));

        assert_eq!(Config::new().initial_capacity(0).table_capacity(), Ok(0));
    }

    #[test]
    fn test_builder_rejects_only_at_build() {
        let builder = ShardedMapBuilder::<i32>::new().buckets(0).load_factor(2.0);
        assert!(matches!(
            builder.build::<i32>(),
            Err(Error::InvalidBucketCount(0))
        ));
    }
}
