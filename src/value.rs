//! Value equality for compare-and-remove.

use std::sync::Arc;

/// A value that can be stored in a [`ShardedMap`](crate::ShardedMap).
///
/// `same_value` is the equality used by
/// [`remove_if_equal`](crate::ShardedMap::remove_if_equal). Floating point
/// values compare by bit pattern, so `NaN` matches an identical `NaN` and
/// `0.0` does not match `-0.0`.
pub trait MapValue: Clone {
    /// Whether `self` and `other` are the same value, bit for bit.
    fn same_value(&self, other: &Self) -> bool;
}

macro_rules! impl_eq_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl MapValue for $t {
                #[inline]
                fn same_value(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_eq_value!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool, char, String,
    Vec<u8>,
);

impl MapValue for f32 {
    #[inline]
    fn same_value(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl MapValue for f64 {
    #[inline]
    fn same_value(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl<V: MapValue> MapValue for Option<V> {
    #[inline]
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_value(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<V: MapValue> MapValue for Box<V> {
    #[inline]
    fn same_value(&self, other: &Self) -> bool {
        (**self).same_value(other)
    }
}

impl<V: MapValue> MapValue for Arc<V> {
    #[inline]
    fn same_value(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other) || (**self).same_value(other)
    }
}
