//! Bucket assignment.
//!
//! A key is turned into a 32-bit seed hash by its [`BucketKey`] impl, the
//! seed is run through the MurmurHash3 `fmix32` finalizer, and the mixed
//! value is reduced to a bucket index. Everything here is a pure function of
//! the key: a map built twice with the same bucket count places every key in
//! the same bucket both times.

use std::hash::Hash;
use std::sync::Arc;

/// Hasher used inside each bucket's table.
#[cfg(not(feature = "fxhash"))]
pub type TableHasher = ahash::RandomState;

/// Hasher used inside each bucket's table.
#[cfg(feature = "fxhash")]
pub type TableHasher = fxhash::FxBuildHasher;

/// A key that can be routed to a bucket.
///
/// Implementations provide a 32-bit seed hash. Wrapper types (`Box`, `Arc`,
/// references, `Option`) forward to the wrapped key so that a boxed key and
/// its bare form always land in the same bucket.
pub trait BucketKey: Hash + Eq {
    /// The 32-bit hash code of this key before mixing.
    fn seed_hash(&self) -> i32;

    /// The bucket this key belongs to, in `[0, buckets)`.
    ///
    /// `buckets` must be at least 1.
    #[inline]
    fn bucket_index(&self, buckets: u32) -> u32 {
        bucket_for_seed(self.seed_hash(), buckets)
    }
}

/// MurmurHash3 32-bit finalizer.
#[inline]
pub fn mix(seed: i32) -> i32 {
    let mut h = seed as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h as i32
}

/// Reduce a mixed hash to `[0, buckets)`.
///
/// `i32::MIN` has no positive counterpart, so the magnitude is taken as an
/// unsigned value instead of negating.
#[inline]
pub fn reduce(mixed: i32, buckets: u32) -> u32 {
    mixed.unsigned_abs() % buckets
}

/// Bucket index for an already computed seed hash.
#[inline]
pub fn bucket_for_seed(seed: i32, buckets: u32) -> u32 {
    reduce(mix(seed), buckets)
}

/// Fold a 64-bit value into 32 bits by XOR-ing its halves.
#[inline]
pub fn fold_long(value: i64) -> i32 {
    (value ^ ((value as u64) >> 32) as i64) as i32
}

/// 31-polynomial hash code over a byte string.
#[inline]
pub fn bytes_hash(bytes: &[u8]) -> i32 {
    bytes
        .iter()
        .fold(0i32, |h, &b| h.wrapping_mul(31).wrapping_add(b as i32))
}

impl BucketKey for i32 {
    #[inline]
    fn seed_hash(&self) -> i32 {
        *self
    }
}

macro_rules! impl_widened_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl BucketKey for $t {
                #[inline]
                fn seed_hash(&self) -> i32 {
                    *self as i32
                }
            }
        )*
    };
}

impl_widened_key!(i8, i16, u8, u16, u32);

macro_rules! impl_long_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl BucketKey for $t {
                #[inline]
                fn seed_hash(&self) -> i32 {
                    fold_long(*self as i64)
                }
            }
        )*
    };
}

impl_long_key!(i64, u64, isize, usize);

impl BucketKey for char {
    #[inline]
    fn seed_hash(&self) -> i32 {
        *self as u32 as i32
    }
}

impl BucketKey for bool {
    #[inline]
    fn seed_hash(&self) -> i32 {
        if *self {
            1231
        } else {
            1237
        }
    }
}

impl BucketKey for str {
    #[inline]
    fn seed_hash(&self) -> i32 {
        bytes_hash(self.as_bytes())
    }
}

impl BucketKey for String {
    #[inline]
    fn seed_hash(&self) -> i32 {
        bytes_hash(self.as_bytes())
    }
}

impl BucketKey for [u8] {
    #[inline]
    fn seed_hash(&self) -> i32 {
        bytes_hash(self)
    }
}

impl BucketKey for Vec<u8> {
    #[inline]
    fn seed_hash(&self) -> i32 {
        bytes_hash(self)
    }
}

impl<K: BucketKey + ?Sized> BucketKey for &K {
    #[inline]
    fn seed_hash(&self) -> i32 {
        (**self).seed_hash()
    }

    #[inline]
    fn bucket_index(&self, buckets: u32) -> u32 {
        (**self).bucket_index(buckets)
    }
}

impl<K: BucketKey + ?Sized> BucketKey for Box<K> {
    #[inline]
    fn seed_hash(&self) -> i32 {
        (**self).seed_hash()
    }

    #[inline]
    fn bucket_index(&self, buckets: u32) -> u32 {
        (**self).bucket_index(buckets)
    }
}

impl<K: BucketKey + ?Sized> BucketKey for Arc<K> {
    #[inline]
    fn seed_hash(&self) -> i32 {
        (**self).seed_hash()
    }

    #[inline]
    fn bucket_index(&self, buckets: u32) -> u32 {
        (**self).bucket_index(buckets)
    }
}

/// `None` is the null key and always lives in bucket 0.
impl<K: BucketKey> BucketKey for Option<K> {
    #[inline]
    fn seed_hash(&self) -> i32 {
        match self {
            Some(key) => key.seed_hash(),
            None => 0,
        }
    }

    #[inline]
    fn bucket_index(&self, buckets: u32) -> u32 {
        match self {
            Some(key) => key.bucket_index(buckets),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // fmix32(SEED_TO_MIN) == i32::MIN
    const SEED_TO_MIN: i32 = 2_126_943_072;

    #[test]
    fn test_mix_known_values() {
        assert_eq!(mix(0), 0);
        assert_eq!(mix(1) as u32, 0x514e_28b7);
        assert_eq!(mix(2) as u32, 0x30f4_c306);
    }

    #[test]
    fn test_min_int_reduces_without_negation() {
        assert_eq!(mix(SEED_TO_MIN), i32::MIN);

        // 2^31 % 3 == 2, 2^31 % 7 == 2, 2^31 % 2 == 0
        assert_eq!(reduce(i32::MIN, 3), 2);
        assert_eq!(reduce(i32::MIN, 7), 2);
        assert_eq!(reduce(i32::MIN, 2), 0);
        assert_eq!(reduce(i32::MIN, 1), 0);

        for buckets in 1..=64 {
            assert!(SEED_TO_MIN.bucket_index(buckets) < buckets);
        }
        assert_eq!(SEED_TO_MIN.bucket_index(3), 2);
    }

    #[test]
    fn test_negative_mixed_values_are_in_range() {
        assert_eq!(reduce(-1, 10), 1);
        assert_eq!(reduce(-15, 10), 5);
        assert_eq!(reduce(i32::MAX, 10), (i32::MAX as u32) % 10);
    }

    #[test]
    fn test_fold_long() {
        assert_eq!(fold_long(0), 0);
        assert_eq!(fold_long(1), 1);
        assert_eq!(fold_long(1 << 32), 1);
        assert_eq!(fold_long(-1), 0);
        assert_eq!(5i64.seed_hash(), 5);
        assert_eq!(5u64.seed_hash(), 5i32.seed_hash());
    }

    #[test]
    fn test_boxed_and_primitive_forms_agree() {
        for key in [-3i64, 0, 7, i64::MAX, i64::MIN, 1 << 40] {
            for buckets in [1, 2, 8, 13, 1024] {
                let expected = key.bucket_index(buckets);
                assert_eq!(Box::new(key).bucket_index(buckets), expected);
                assert_eq!(Arc::new(key).bucket_index(buckets), expected);
                assert_eq!((&key).bucket_index(buckets), expected);
                assert_eq!(Some(key).bucket_index(buckets), expected);
            }
        }
    }

    #[test]
    fn test_string_forms_agree() {
        let owned = String::from("bucket");
        let boxed: Box<str> = "bucket".into();
        assert_eq!(owned.seed_hash(), "bucket".seed_hash());
        assert_eq!(owned.seed_hash(), boxed.seed_hash());
        assert_eq!(owned.seed_hash(), b"bucket".to_vec().seed_hash());
        assert_eq!("".seed_hash(), 0);
        assert_eq!("a".seed_hash(), 97);
        assert_eq!("ab".seed_hash(), 97 * 31 + 98);
    }

    #[test]
    fn test_null_key_is_bucket_zero() {
        for buckets in [1, 2, 17, 100_000_000] {
            assert_eq!(None::<i32>.bucket_index(buckets), 0);
            assert_eq!(None::<String>.bucket_index(buckets), 0);
        }
    }

    #[test]
    fn test_clustered_keys_spread() {
        // Multiples of 1024 share their low bits; the mix has to spread them.
        let buckets = 16u32;
        let mut counts = vec![0usize; buckets as usize];
        for i in 0..16_000i32 {
            counts[(i * 1024).bucket_index(buckets) as usize] += 1;
        }
        let min = *counts.iter().min().unwrap();
        let max = *counts.iter().max().unwrap();
        assert!(min > 700, "bucket too light: {:?}", counts);
        assert!(max < 1300, "bucket too heavy: {:?}", counts);
    }
}
