use crate::config::MAX_BUCKETS;

/// Errors that can occur when building a ShardedMap.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The bucket count is outside `[1, MAX_BUCKETS]`.
    InvalidBucketCount(u32),
    /// The load factor is not a finite value in `(0, 1]`.
    InvalidLoadFactor(f32),
    /// The per-bucket table of this many slots cannot be reserved.
    CapacityOverflow(usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidBucketCount(count) => write!(
                f,
                "bucket count must be between 1 and {}, got {}",
                MAX_BUCKETS, count
            ),
            Error::InvalidLoadFactor(factor) => {
                write!(f, "load factor must be in (0, 1], got {}", factor)
            }
            Error::CapacityOverflow(capacity) => {
                write!(f, "cannot reserve {} slots per bucket", capacity)
            }
        }
    }
}

impl std::error::Error for Error {}
