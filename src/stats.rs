//! Statistics and diagnostics types.

#[cfg(feature = "metrics")]
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-bucket operation statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketOps {
    /// Read operations that found their key.
    pub reads: u64,
    /// Writes that stored a value (puts and computed inserts/updates).
    pub writes: u64,
    /// Removals that deleted an entry.
    pub removes: u64,
    /// Number of lock acquisitions (0 when metrics feature disabled).
    pub lock_acquisitions: u64,
    /// Failed try-lock attempts while busy-waiting (0 when metrics disabled).
    pub spin_retries: u64,
    /// Cumulative lock wait time in nanoseconds (0 when lock-timing disabled).
    pub lock_wait_nanos: u64,
}

/// Thread-safe statistics tracker for a single bucket.
#[cfg(feature = "metrics")]
pub(crate) struct BucketStats {
    reads: AtomicU64,
    writes: AtomicU64,
    removes: AtomicU64,
    lock_acquisitions: AtomicU64,
    spin_retries: AtomicU64,
    #[cfg(feature = "lock-timing")]
    lock_wait_nanos: AtomicU64,
}

#[cfg(feature = "metrics")]
impl BucketStats {
    pub fn new() -> Self {
        Self {
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            removes: AtomicU64::new(0),
            lock_acquisitions: AtomicU64::new(0),
            spin_retries: AtomicU64::new(0),
            #[cfg(feature = "lock-timing")]
            lock_wait_nanos: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_remove(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_lock_acquisition(&self) {
        self.lock_acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_spin_retries(&self, retries: u64) {
        self.spin_retries.fetch_add(retries, Ordering::Relaxed);
    }

    #[cfg(feature = "lock-timing")]
    #[inline]
    pub fn record_lock_wait(&self, nanos: u64) {
        self.lock_wait_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> BucketOps {
        BucketOps {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            lock_acquisitions: self.lock_acquisitions.load(Ordering::Relaxed),
            spin_retries: self.spin_retries.load(Ordering::Relaxed),
            #[cfg(feature = "lock-timing")]
            lock_wait_nanos: self.lock_wait_nanos.load(Ordering::Relaxed),
            #[cfg(not(feature = "lock-timing"))]
            lock_wait_nanos: 0,
        }
    }
}

/// Zero-sized placeholder when metrics are disabled.
#[cfg(not(feature = "metrics"))]
pub(crate) struct BucketStats;

#[cfg(not(feature = "metrics"))]
impl BucketStats {
    pub fn new() -> Self {
        BucketStats
    }

    #[inline]
    pub fn record_read(&self) {}

    #[inline]
    pub fn record_write(&self) {}

    #[inline]
    pub fn record_remove(&self) {}

    #[inline]
    pub fn record_lock_acquisition(&self) {}

    #[inline]
    pub fn record_spin_retries(&self, _retries: u64) {}

    pub fn snapshot(&self) -> BucketOps {
        BucketOps::default()
    }
}

impl Default for BucketStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate statistics for a ShardedMap instance.
///
/// Each bucket is sampled under its own read lock, one after another, so
/// under concurrent writes the numbers are per-bucket consistent only.
#[derive(Debug, Clone)]
pub struct Stats {
    /// Total number of entries across all buckets.
    pub size: usize,
    /// Number of entries in each bucket.
    pub bucket_sizes: Vec<usize>,
    /// Operation counts for each bucket.
    pub operations: Vec<BucketOps>,
}

/// Per-bucket diagnostics snapshot.
#[derive(Debug, Clone)]
pub struct BucketDiagnostics {
    /// Number of entries in this bucket.
    pub entries: usize,
    /// Operation and lock counters for this bucket.
    pub ops: BucketOps,
}

/// Structured snapshot for load and contention introspection.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    /// Total number of entries across all buckets.
    pub total_entries: usize,
    /// Per-bucket diagnostics.
    pub buckets: Vec<BucketDiagnostics>,
    /// Total read + write + remove operations (0 when metrics disabled).
    pub total_operations: u64,
    /// Total busy-wait retries (0 when metrics disabled).
    pub total_spin_retries: u64,
    /// Average load (entries) per bucket.
    pub avg_load_per_bucket: f64,
    /// Max load / avg load ratio. 0.0 for an empty map.
    pub max_load_ratio: f64,
}

impl Diagnostics {
    pub(crate) fn from_buckets(buckets: Vec<BucketDiagnostics>) -> Self {
        let total_entries: usize = buckets.iter().map(|b| b.entries).sum();
        let total_operations = buckets
            .iter()
            .map(|b| b.ops.reads + b.ops.writes + b.ops.removes)
            .sum();
        let total_spin_retries = buckets.iter().map(|b| b.ops.spin_retries).sum();
        let max_entries = buckets.iter().map(|b| b.entries).max().unwrap_or(0);

        let avg_load_per_bucket = if buckets.is_empty() {
            0.0
        } else {
            total_entries as f64 / buckets.len() as f64
        };
        let max_load_ratio = if avg_load_per_bucket > 0.0 {
            max_entries as f64 / avg_load_per_bucket
        } else {
            0.0
        };

        Self {
            total_entries,
            buckets,
            total_operations,
            total_spin_retries,
            avg_load_per_bucket,
            max_load_ratio,
        }
    }
}
