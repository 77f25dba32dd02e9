//! # primshard
//!
//! A concurrent map over primitive keys and values, sharded into
//! independently locked buckets.
//!
//! Every key is routed to one bucket by a pure hash function. Each bucket
//! owns its own hash table behind a read-write lock, so threads working on
//! different buckets never contend. Keys and values are stored unboxed: a
//! [`LongLongMap`] is a set of `hashbrown` tables of `(i64, i64)`.
//!
//! ## Features
//!
//! - **Sharded locking**: one reader-writer lock per bucket, no map-wide lock
//! - **Two lock modes**: park the thread ([`LockMode::Blocking`]) or spin on
//!   try-lock ([`LockMode::BusyWaiting`])
//! - **Deterministic routing**: boxed and bare keys pick the same bucket
//! - **Default values**: absent keys read as a configured value
//! - **Statistics**: per-bucket sizes, operation and lock counters
//!
//! ## Example
//!
//! ```rust
//! use primshard::{LockMode, LongLongMap, ShardedMapBuilder};
//!
//! let map: LongLongMap = ShardedMapBuilder::new()
//!     .buckets(16)
//!     .initial_capacity(1_000)
//!     .load_factor(0.75)
//!     .mode(LockMode::Blocking)
//!     .default_value(-1)
//!     .build()?;
//!
//! assert_eq!(map.put(1, 10), -1);
//! assert_eq!(map.put(1, 11), 10);
//! assert_eq!(map.get(&1), 11);
//! assert_eq!(map.get(&2), -1);
//!
//! map.compute_if_present(&1, |_, v| v + 1);
//! assert_eq!(map.get(&1), 12);
//!
//! assert!(map.remove_if_equal(&1, &12));
//! assert!(map.is_empty());
//! # Ok::<(), primshard::Error>(())
//! ```
//!
//! ## Concurrency
//!
//! Operations on one key are linearized by its bucket lock. `len`,
//! `is_empty` and `clear` visit buckets one after another and are not atomic
//! snapshots of the whole map.

#![deny(missing_docs)]
#![warn(clippy::all)]

mod bucket;
/// Configuration and builder types.
pub mod config;
/// Error types.
pub mod error;
/// Bucket routing hash.
pub mod hash;
/// Iterator implementations.
pub mod iter;
mod lock;
/// Main ShardedMap implementation.
pub mod sharded_map;
/// Statistics and metrics collection.
pub mod stats;
/// Value equality.
pub mod value;

// Re-export main types
pub use config::{Config, LockMode, ShardedMapBuilder, MAX_BUCKETS};
pub use error::Error;
pub use hash::BucketKey;
pub use sharded_map::{
    IntIntMap, IntLongMap, LongIntMap, LongLongMap, LongObjectMap, ObjectIntMap, ObjectLongMap,
    ShardedMap,
};
pub use stats::{BucketDiagnostics, BucketOps, Diagnostics, Stats};
pub use value::MapValue;
