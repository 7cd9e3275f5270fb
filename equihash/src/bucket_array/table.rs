//! Fixed capacity, depth-capped bucket table

use super::entry::Entry;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::OnceLock;

/// Hash table of `num_buckets` buckets with `depth` slots each
///
/// Inserts take `&self` and may run concurrently from many threads. Reads
/// are only meaningful once every insert of the current phase has returned;
/// the solver guarantees this with a barrier between phases.
#[derive(Debug)]
pub(crate) struct BucketTable {
    /// Slots per bucket
    depth: usize,
    /// Occupancy of each bucket, clamped at `depth`
    counts: Box<[AtomicU32]>,
    /// Entry storage, bucket `b` owns `slots[b * depth..(b + 1) * depth]`
    slots: Box<[OnceLock<Entry>]>,
    /// Inserts dropped because their bucket was full
    overflow: AtomicU64,
}

impl BucketTable {
    /// Allocate an empty table.
    pub(crate) fn new(num_buckets: usize, depth: usize) -> Self {
        assert!(depth > 0 && u32::try_from(depth).is_ok());
        Self {
            depth,
            counts: (0..num_buckets).map(|_| AtomicU32::new(0)).collect(),
            slots: (0..num_buckets * depth).map(|_| OnceLock::new()).collect(),
            overflow: AtomicU64::new(0),
        }
    }

    /// Number of buckets
    pub(crate) fn num_buckets(&self) -> usize {
        self.counts.len()
    }

    /// Slots per bucket
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// Store `entry` in `bucket` if it has a free slot.
    ///
    /// Returns false, and counts an overflow, if the bucket is already full.
    /// Panics if `bucket` is out of range.
    #[inline(always)]
    pub(crate) fn insert(&self, bucket: usize, entry: Entry) -> bool {
        let depth = self.depth as u32;
        let reserved = self.counts[bucket].fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
            (count < depth).then_some(count + 1)
        });
        match reserved {
            Ok(slot) => {
                // The counter hands out each slot once per fill
                let stored = self.slots[bucket * self.depth + slot as usize].set(entry);
                debug_assert!(stored.is_ok());
                true
            }
            Err(_) => {
                self.overflow.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Number of entries stored in `bucket`.
    #[inline(always)]
    pub(crate) fn count(&self, bucket: usize) -> usize {
        self.counts[bucket].load(Ordering::Acquire) as usize
    }

    /// One stored entry.
    ///
    /// Panics if `slot` is not below [`Self::count`] for this bucket.
    #[inline(always)]
    pub(crate) fn entry(&self, bucket: usize, slot: usize) -> &Entry {
        assert!(slot < self.count(bucket));
        self.slots[bucket * self.depth + slot]
            .get()
            .expect("reserved slots are written before the phase ends")
    }

    /// All entries stored in `bucket`, in slot order.
    pub(crate) fn entries(&self, bucket: usize) -> impl Iterator<Item = &Entry> + '_ {
        (0..self.count(bucket)).map(move |slot| self.entry(bucket, slot))
    }

    /// Total number of stored entries
    pub(crate) fn len(&self) -> usize {
        (0..self.num_buckets()).map(|bucket| self.count(bucket)).sum()
    }

    /// Bytes of slot and counter storage
    pub(crate) fn size(&self) -> usize {
        self.slots.len() * std::mem::size_of::<OnceLock<Entry>>()
            + self.counts.len() * std::mem::size_of::<AtomicU32>()
    }

    /// Number of buckets holding each possible count of entries.
    ///
    /// Index `c` of the result is how many buckets hold exactly `c`
    /// entries, for every `c` from zero up to the depth.
    pub(crate) fn occupancy(&self) -> Vec<u64> {
        let mut histogram = vec![0u64; self.depth + 1];
        for bucket in 0..self.num_buckets() {
            histogram[self.count(bucket)] += 1;
        }
        histogram
    }

    /// Inserts dropped since the last [`Self::clear`]
    pub(crate) fn overflow(&self) -> u64 {
        self.overflow.load(Ordering::Relaxed)
    }

    /// Empty every bucket and reset the overflow counter.
    ///
    /// Only the occupied prefix of each bucket is visited.
    pub(crate) fn clear(&mut self) {
        let depth = self.depth;
        for (bucket, count) in self.counts.iter_mut().enumerate() {
            let used = std::mem::take(count.get_mut()) as usize;
            for slot in &mut self.slots[bucket * depth..bucket * depth + used] {
                let _ = slot.take();
            }
        }
        *self.overflow.get_mut() = 0;
    }
}

#[cfg(test)]
mod test {
    use super::BucketTable;
    use crate::bits::BitString;
    use crate::bucket_array::entry::Entry;
    use proptest::prelude::*;

    fn entry(index: u32) -> Entry {
        Entry::leaf(BitString::from_words([u64::from(index), 0, 0, 0]), index)
    }

    #[test]
    fn fill_and_overflow() {
        let table = BucketTable::new(4, 2);
        assert!(table.insert(1, entry(10)));
        assert!(table.insert(1, entry(11)));
        assert!(!table.insert(1, entry(12)));
        assert!(table.insert(3, entry(13)));

        assert_eq!(table.count(0), 0);
        assert_eq!(table.count(1), 2);
        assert_eq!(table.overflow(), 1);
        assert_eq!(table.len(), 3);
        let stored: Vec<u32> = table.entries(1).map(|e| e.link().index()).collect();
        assert_eq!(stored, vec![10, 11]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut table = BucketTable::new(2, 1);
        assert!(table.insert(0, entry(1)));
        assert!(!table.insert(0, entry(2)));
        table.clear();
        assert_eq!(table.len(), 0);
        assert_eq!(table.overflow(), 0);
        assert!(table.insert(0, entry(3)));
        assert_eq!(table.entry(0, 0).link().index(), 3);
    }

    #[test]
    fn concurrent_inserts() {
        let table = BucketTable::new(8, 12);
        std::thread::scope(|scope| {
            for thread in 0..4u32 {
                let table = &table;
                scope.spawn(move || {
                    for i in 0..100 {
                        table.insert((i % 8) as usize, entry(thread * 1000 + i));
                    }
                });
            }
        });
        assert_eq!(table.len(), 8 * 12);
        assert_eq!(table.overflow(), 400 - 8 * 12);
        for bucket in 0..8 {
            assert_eq!(table.entries(bucket).count(), 12);
        }
    }

    #[test]
    fn occupancy_histogram() {
        let table = BucketTable::new(5, 3);
        for (i, bucket) in [0, 0, 0, 0, 2, 4, 4].into_iter().enumerate() {
            table.insert(bucket, entry(i as u32));
        }
        assert_eq!(table.occupancy(), vec![2, 1, 1, 1]);
    }

    proptest! {
        #[test]
        fn stored_plus_overflow_is_attempts(
            depth in 1usize..6,
            buckets in proptest::collection::vec(0usize..4, 0..64),
        ) {
            let table = BucketTable::new(4, depth);
            let mut accepted = 0;
            for (i, bucket) in buckets.iter().enumerate() {
                if table.insert(*bucket, entry(i as u32)) {
                    accepted += 1;
                }
            }
            for bucket in 0..4 {
                let attempts = buckets.iter().filter(|b| **b == bucket).count();
                prop_assert!(table.count(bucket) <= depth);
                prop_assert_eq!(table.count(bucket), attempts.min(depth));
            }
            prop_assert_eq!(table.len(), accepted);
            prop_assert_eq!(table.len() as u64 + table.overflow(), buckets.len() as u64);

            let histogram = table.occupancy();
            prop_assert_eq!(histogram.len(), depth + 1);
            prop_assert_eq!(histogram.iter().sum::<u64>(), 4);
            let weighted: u64 = histogram.iter().enumerate().map(|(c, n)| c as u64 * n).sum();
            prop_assert_eq!(weighted, table.len() as u64);
        }
    }
}
