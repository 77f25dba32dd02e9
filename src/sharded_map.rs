use crate::bucket::Bucket;
use crate::config::{Config, LockMode};
use crate::error::Error;
use crate::hash::BucketKey;
use crate::iter::SnapshotIter;
use crate::stats::{BucketDiagnostics, BucketOps, Diagnostics, Stats};
use crate::value::MapValue;
use crossbeam_utils::CachePadded;
use std::borrow::Borrow;
use tracing::{debug, warn};

/// `i32` keys, `i32` values.
pub type IntIntMap = ShardedMap<i32, i32>;
/// `i32` keys, `i64` values.
pub type IntLongMap = ShardedMap<i32, i64>;
/// `i64` keys, `i32` values.
pub type LongIntMap = ShardedMap<i64, i32>;
/// `i64` keys, `i64` values.
pub type LongLongMap = ShardedMap<i64, i64>;
/// `i64` keys, arbitrary values.
pub type LongObjectMap<V> = ShardedMap<i64, V>;
/// Arbitrary keys, `i32` values.
pub type ObjectIntMap<K> = ShardedMap<K, i32>;
/// Arbitrary keys, `i64` values.
pub type ObjectLongMap<K> = ShardedMap<K, i64>;

/// Concurrent map sharded into independently locked buckets.
///
/// Each key is routed to one bucket by [`BucketKey::bucket_index`]. A bucket
/// owns a plain hash table behind a read-write lock, so operations on
/// different buckets never wait for each other and operations on the same
/// bucket are serialized. Lookups take the shared lock; anything that may
/// write takes the exclusive lock.
///
/// Absent keys never surface as `Option`: `get`, `put`, `remove` and
/// `compute_if_present` return the map's configured default value instead.
/// Use [`contains_key`](Self::contains_key) to tell "absent" from "stored
/// default".
///
/// # Example
///
/// ```rust
/// use primshard::{IntIntMap, ShardedMapBuilder};
///
/// let map: IntIntMap = ShardedMapBuilder::new()
///     .buckets(2)
///     .initial_capacity(16)
///     .default_value(-1)
///     .build()?;
///
/// map.put(1, 10);
/// assert_eq!(map.get(&1), 10);
/// assert_eq!(map.get(&2), -1);
/// assert!(!map.remove_if_equal(&2, &1));
/// assert!(!map.contains_key(&2));
/// # Ok::<(), primshard::Error>(())
/// ```
pub struct ShardedMap<K, V> {
    buckets: Box<[CachePadded<Bucket<K, V>>]>,
    bucket_count: u32,
    mode: LockMode,
    default_value: V,
}

impl<K, V> ShardedMap<K, V>
where
    K: BucketKey + Send + Sync,
    V: MapValue + Send + Sync,
{
    /// Create a new map with the default configuration and `V::default()` as
    /// the default value.
    pub fn new() -> Self
    where
        V: Default,
    {
        let config = Config::default();
        let capacity = config
            .table_capacity()
            .unwrap_or(config.initial_capacity);
        let buckets = (0..config.buckets)
            .map(|_| CachePadded::new(Bucket::new(capacity, config.mode)))
            .collect();
        Self::assemble(&config, capacity, buckets, V::default())
    }

    /// Create a new map from `config`, returning `default_value` for absent
    /// keys.
    ///
    /// Fails if `config` does not validate or a bucket's table cannot
    /// reserve its initial capacity.
    pub fn with_config(config: Config, default_value: V) -> Result<Self, Error> {
        let allocated = config.validate().and_then(|()| {
            let capacity = config.table_capacity()?;
            let buckets = (0..config.buckets)
                .map(|_| Bucket::try_new(capacity, config.mode).map(CachePadded::new))
                .collect::<Result<Box<[CachePadded<Bucket<K, V>>]>, Error>>()?;
            Ok((capacity, buckets))
        });

        match allocated {
            Ok((capacity, buckets)) => Ok(Self::assemble(&config, capacity, buckets, default_value)),
            Err(err) => {
                warn!(%err, "rejected sharded map configuration");
                Err(err)
            }
        }
    }

    fn assemble(
        config: &Config,
        capacity: usize,
        buckets: Box<[CachePadded<Bucket<K, V>>]>,
        default_value: V,
    ) -> Self {
        debug!(
            buckets = config.buckets,
            initial_capacity = config.initial_capacity,
            load_factor = config.load_factor,
            table_capacity = capacity,
            mode = ?config.mode,
            "built sharded map"
        );

        Self {
            buckets,
            bucket_count: config.buckets,
            mode: config.mode,
            default_value,
        }
    }

    #[inline]
    fn bucket<Q>(&self, key: &Q) -> &Bucket<K, V>
    where
        Q: BucketKey + ?Sized,
    {
        &self.buckets[key.bucket_index(self.bucket_count) as usize]
    }

    #[inline]
    fn or_default(&self, value: Option<V>) -> V {
        value.unwrap_or_else(|| self.default_value.clone())
    }

    /// Get the value stored for `key`, or the default value.
    pub fn get<Q>(&self, key: &Q) -> V
    where
        K: Borrow<Q>,
        Q: BucketKey + ?Sized,
    {
        self.or_default(self.bucket(key).get(key))
    }

    /// Whether `key` has a stored value.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: BucketKey + ?Sized,
    {
        self.bucket(key).contains_key(key)
    }

    /// Insert or overwrite. Returns the previous value, or the default value
    /// if there was none.
    pub fn put(&self, key: K, value: V) -> V {
        let previous = self.bucket(&key).insert(key, value);
        self.or_default(previous)
    }

    /// Remove `key`. Returns the removed value, or the default value if the
    /// key was absent.
    pub fn remove<Q>(&self, key: &Q) -> V
    where
        K: Borrow<Q>,
        Q: BucketKey + ?Sized,
    {
        self.or_default(self.bucket(key).remove(key))
    }

    /// Remove `key` only if it currently maps to `expected`, compared with
    /// [`MapValue::same_value`]. Returns whether an entry was removed.
    pub fn remove_if_equal<Q>(&self, key: &Q, expected: &V) -> bool
    where
        K: Borrow<Q>,
        Q: BucketKey + ?Sized,
    {
        self.bucket(key).remove_if_equal(key, expected)
    }

    /// Return the value for `key`, computing and storing `f(&key)` first if
    /// the key is absent.
    ///
    /// `f` runs while the bucket's write lock is held, so it must not touch
    /// this map. A panic in `f` releases the lock, stores nothing and
    /// propagates to the caller.
    ///
    /// ```rust
    /// use primshard::LongLongMap;
    ///
    /// let map = LongLongMap::new();
    /// assert_eq!(map.compute_if_absent(7, |k| k * 2), 14);
    /// assert_eq!(map.compute_if_absent(7, |_| 0), 14);
    /// ```
    pub fn compute_if_absent<F>(&self, key: K, f: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        self.bucket(&key).compute_if_absent(key, f)
    }

    /// If `key` is present, replace its value with `f(key, current)` and
    /// return the new value. Otherwise return the default value.
    ///
    /// Runs under the bucket's write lock, with the same rules as
    /// [`compute_if_absent`](Self::compute_if_absent).
    pub fn compute_if_present<Q, F>(&self, key: &Q, f: F) -> V
    where
        K: Borrow<Q>,
        Q: BucketKey + ?Sized,
        F: FnOnce(&K, &V) -> V,
    {
        self.or_default(self.bucket(key).compute_if_present(key, f))
    }

    /// Get the total number of entries across all buckets.
    ///
    /// Buckets are counted one at a time under their read locks; with
    /// concurrent writers the sum mixes before and after states.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.len()).sum()
    }

    /// Check if every bucket is empty. Stops at the first non-empty bucket.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.is_empty())
    }

    /// Empty every bucket, one write lock at a time.
    ///
    /// Not atomic across buckets: a concurrent reader can still see entries
    /// in a bucket that has not been reached yet.
    pub fn clear(&self) {
        for bucket in self.buckets.iter() {
            bucket.clear();
        }
    }

    /// The value returned for absent keys.
    pub fn default_value(&self) -> &V {
        &self.default_value
    }

    /// Number of buckets, fixed at construction.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Lock acquisition mode, fixed at construction.
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Index of the bucket `key` is routed to.
    pub fn bucket_of<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: BucketKey + ?Sized,
    {
        key.bucket_index(self.bucket_count) as usize
    }

    /// Number of entries in each bucket.
    pub fn bucket_sizes(&self) -> Vec<usize> {
        self.buckets.iter().map(|bucket| bucket.len()).collect()
    }

    /// Get sizes and operation counters for every bucket.
    pub fn stats(&self) -> Stats {
        let bucket_sizes = self.bucket_sizes();
        let operations: Vec<BucketOps> = self.buckets.iter().map(|b| b.stats()).collect();
        let size = bucket_sizes.iter().sum();

        Stats {
            size,
            bucket_sizes,
            operations,
        }
    }

    /// Get a load and contention report for every bucket.
    pub fn diagnostics(&self) -> Diagnostics {
        let buckets = self
            .buckets
            .iter()
            .map(|bucket| BucketDiagnostics {
                entries: bucket.len(),
                ops: bucket.stats(),
            })
            .collect();
        Diagnostics::from_buckets(buckets)
    }

    /// Iterate over clones of all entries.
    ///
    /// Entries are copied out bucket by bucket, each under its read lock,
    /// before the iterator is returned. Later writes are not observed.
    ///
    /// ```rust
    /// use primshard::IntLongMap;
    ///
    /// let map = IntLongMap::new();
    /// map.put(1, 100);
    /// map.put(2, 200);
    ///
    /// let total: i64 = map.iter_snapshot().map(|(_, v)| v).sum();
    /// assert_eq!(total, 300);
    /// ```
    pub fn iter_snapshot(&self) -> SnapshotIter<K, V>
    where
        K: Clone,
    {
        SnapshotIter::new(&self.buckets)
    }
}

impl<K, V> Default for ShardedMap<K, V>
where
    K: BucketKey + Send + Sync,
    V: MapValue + Default + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}
