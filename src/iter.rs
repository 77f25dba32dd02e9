use crate::bucket::Bucket;
use crate::value::MapValue;
use crossbeam_utils::CachePadded;
use std::hash::Hash;

/// Iterator over entries copied out of the map.
///
/// Built by [`ShardedMap::iter_snapshot`](crate::ShardedMap::iter_snapshot).
/// Each bucket is copied under its own read lock, so the result is
/// consistent per bucket but not across buckets.
pub struct SnapshotIter<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> SnapshotIter<K, V>
where
    K: Hash + Eq + Clone,
    V: MapValue,
{
    pub(crate) fn new(buckets: &[CachePadded<Bucket<K, V>>]) -> Self {
        let mut entries = Vec::new();
        for bucket in buckets {
            bucket.collect_into(&mut entries);
        }
        Self {
            entries: entries.into_iter(),
        }
    }
}

impl<K, V> Iterator for SnapshotIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> ExactSizeIterator for SnapshotIter<K, V> {}
