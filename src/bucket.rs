use crate::config::LockMode;
use crate::error::Error;
use crate::hash::TableHasher;
use crate::lock::{acquire_read, acquire_write};
use crate::stats::{BucketOps, BucketStats};
use crate::value::MapValue;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::borrow::Borrow;
use std::hash::Hash;

/// The single-threaded table owned by one bucket.
pub(crate) type Table<K, V> = HashMap<K, V, TableHasher>;

/// One partition of the keyspace: a table behind its own read-write lock.
///
/// The table is only ever reached through a guard from [`Bucket::read`] or
/// [`Bucket::write`], which acquire according to the bucket's [`LockMode`].
pub(crate) struct Bucket<K, V> {
    table: RwLock<Table<K, V>>,
    mode: LockMode,
    stats: BucketStats,
}

impl<K, V> Bucket<K, V>
where
    K: Hash + Eq,
    V: MapValue,
{
    pub fn new(capacity: usize, mode: LockMode) -> Self {
        Self::with_table(
            HashMap::with_capacity_and_hasher(capacity, TableHasher::default()),
            mode,
        )
    }

    /// Like [`Bucket::new`], but reports a reservation the table cannot make
    /// instead of panicking.
    pub fn try_new(capacity: usize, mode: LockMode) -> Result<Self, Error> {
        let mut table: Table<K, V> = HashMap::with_hasher(TableHasher::default());
        table
            .try_reserve(capacity)
            .map_err(|_| Error::CapacityOverflow(capacity))?;
        Ok(Self::with_table(table, mode))
    }

    fn with_table(table: Table<K, V>, mode: LockMode) -> Self {
        Self {
            table: RwLock::new(table),
            mode,
            stats: BucketStats::new(),
        }
    }

    /// Shared guard on this bucket's table.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Table<K, V>> {
        acquire_read(self.mode, &self.table, &self.stats)
    }

    /// Exclusive guard on this bucket's table.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Table<K, V>> {
        acquire_write(self.mode, &self.table, &self.stats)
    }

    /// Get a clone of the value stored for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let table = self.read();
        let result = table.get(key).cloned();
        if result.is_some() {
            self.stats.record_read();
        }
        result
    }

    /// Check if a key exists without cloning the value.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.read().contains_key(key)
    }

    /// Insert or overwrite, returning the previous value if any.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let mut table = self.write();
        let result = table.insert(key, value);
        self.stats.record_write();
        result
    }

    /// Remove a key, returning its value if it existed.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut table = self.write();
        let result = table.remove(key);
        if result.is_some() {
            self.stats.record_remove();
        }
        result
    }

    /// Remove `key` only if its current value is the same as `expected`.
    pub fn remove_if_equal<Q>(&self, key: &Q, expected: &V) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut table = self.write();
        let matches = table
            .get(key)
            .is_some_and(|current| current.same_value(expected));
        if matches {
            table.remove(key);
            self.stats.record_remove();
        }
        matches
    }

    /// Return the stored value, or compute, store and return a new one.
    ///
    /// `f` runs under the write guard. If it panics the guard is dropped
    /// during unwinding and nothing is stored.
    pub fn compute_if_absent<F>(&self, key: K, f: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        let mut table = self.write();
        match table.entry(key) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let value = f(entry.key());
                let stored = entry.insert(value).clone();
                self.stats.record_write();
                stored
            }
        }
    }

    /// Replace the stored value with `f(key, current)` if the key is present.
    pub fn compute_if_present<Q, F>(&self, key: &Q, f: F) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&K, &V) -> V,
    {
        let mut table = self.write();
        let (stored_key, current) = table.get_key_value_mut(key)?;
        let value = f(stored_key, current);
        *current = value.clone();
        self.stats.record_write();
        Some(value)
    }

    /// Get the number of entries in this bucket.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if this bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop every entry, keeping the allocated capacity.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Get a snapshot of statistics for this bucket.
    pub fn stats(&self) -> BucketOps {
        self.stats.snapshot()
    }

    /// Append clones of every entry to `out` under one read guard.
    pub fn collect_into(&self, out: &mut Vec<(K, V)>)
    where
        K: Clone,
    {
        let table = self.read();
        out.reserve(table.len());
        out.extend(table.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}
